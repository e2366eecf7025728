//! Train timetable reconciliation.
//!
//! Turns national-timetable train variants into deduplicated GTFS service
//! calendars, identifies which scheduled train a single delay record refers
//! to, and assigns authoritative train numbers to the rail trips of a merged
//! feed by edge voting.

pub mod calendar;
pub mod config;
pub mod domain;
pub mod feed;
pub mod identify;
pub mod input;
pub mod reconcile;
