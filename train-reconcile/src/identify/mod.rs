//! Identifying one train record in another source.
//!
//! Given a departure from the timetable, find the matching record among live
//! records that use different identifiers, with a confidence tier saying how
//! the match was made.

mod departures;
mod matcher;

pub use departures::{DayGroup, Departure, departures_between, departures_in, minutes_by_hour};
pub use matcher::{
    MatchCandidate, MatchConfidence, MatchDecision, MatchReason, MatchTarget, match_single,
    match_single_with,
};
