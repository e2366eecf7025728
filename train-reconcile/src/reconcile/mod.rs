//! Assigning authoritative train numbers to another feed's trips.
//!
//! The authoritative feed names every train but uses its own stop ids; the
//! target feed has the same physical runs under different ids and often no
//! train numbers. Trips are compared by the stop names, departure minutes
//! and weekdays of their edges. Each target trip takes the label that most
//! of its edges vote for, provided the vote is decisive enough.

mod edges;
mod index;
mod report;
mod resolve;


pub use edges::{EdgeKey, EdgeTrip, FeedEdges, NamedEdge};
pub use index::{EdgeVoteIndex, IndexStats, VoteTally};
pub use report::{
    AuditRow, CandidateVotes, MatchStats, MatchedTrip, ReconciliationReport, Reconciler,
    ShortNameAssignment,
};
pub use resolve::{AmbiguityReason, BulkOutcome, BulkResolution, resolve_bulk, resolve_votes};
