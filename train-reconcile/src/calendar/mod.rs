//! Service calendars for trains.
//!
//! A train's operating days arrive as a bitmap over a validity period. This
//! module turns bitmaps into active-date sets, infers a weekly pattern plus
//! exception dates for each, interns identical calendars, and produces
//! GTFS `calendar` / `calendar_dates` rows.

mod gtfs;
mod registry;
mod run;
mod service;

pub use gtfs::{CalendarDateRow, CalendarRow, TripServiceRow, gtfs_date, parse_gtfs_date};
pub use registry::{CalendarId, CalendarRegistry, SharedCalendarRegistry};
pub use run::{
    ConversionRun, ConvertedCalendars, MIN_STOPS, SkipReason, TrainVariant, VariantOutcome,
};
pub use service::{
    CalendarException, ExceptionKind, ServiceCalendar, expand_pattern, parse_validity_timestamp,
};
