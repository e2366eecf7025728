//! One conversion run over a set of train variants.
//!
//! The run owns the calendar registry and remembers which dates each core id
//! already runs on, so that a second variant of the same train claiming one of
//! those dates is rejected.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::gtfs::{CalendarDateRow, CalendarRow, TripServiceRow};
use super::registry::{CalendarId, CalendarRegistry};
use super::service::{ServiceCalendar, parse_validity_timestamp};
use crate::domain::CalendarFormatError;

/// Minimum number of stops for a variant to be worth a trip.
pub const MIN_STOPS: usize = 2;

/// One variant of a train as read from the national timetable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrainVariant {
    pub core_id: String,
    #[serde(default)]
    pub variant: String,
    pub bitmap: String,
    /// `YYYY-MM-DDT00:00:00`
    pub validity_start: String,
    #[serde(default)]
    pub validity_end: Option<String>,
    pub stop_count: usize,
}

impl TrainVariant {
    /// Output trip id.
    ///
    /// The core id loses surrounding dashes, leading zeros and trailing `A`s;
    /// a non-zero variant is appended after a dash without its leading zeros.
    ///
    /// ```
    /// use train_reconcile::calendar::TrainVariant;
    ///
    /// let v = TrainVariant {
    ///     core_id: "--0012345A".into(),
    ///     variant: "02".into(),
    ///     bitmap: "1".into(),
    ///     validity_start: "2024-12-15T00:00:00".into(),
    ///     validity_end: None,
    ///     stop_count: 3,
    /// };
    /// assert_eq!(v.trip_id(), "12345-2");
    /// ```
    pub fn trip_id(&self) -> String {
        let core = self
            .core_id
            .trim()
            .trim_matches('-')
            .trim_start_matches('0')
            .trim_end_matches('A');
        let variant = self.variant.trim().trim_start_matches('0');
        if variant.is_empty() {
            core.to_string()
        } else {
            format!("{core}-{variant}")
        }
    }

    fn calendar(&self) -> Result<ServiceCalendar, CalendarFormatError> {
        let start = parse_validity_timestamp(&self.validity_start)?;
        let end = self
            .validity_end
            .as_deref()
            .map(parse_validity_timestamp)
            .transpose()?;
        ServiceCalendar::from_bitmap(&self.bitmap, start, end)
    }
}

/// Why a variant did not become a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Calendar fields could not be read
    Malformed(CalendarFormatError),
    /// Fewer than [`MIN_STOPS`] stops
    TooFewStops(usize),
    /// Another variant of the same core id already runs on these dates
    Overlap { dates: BTreeSet<NaiveDate> },
}

/// Result of offering one variant to a [`ConversionRun`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantOutcome {
    Accepted { trip_id: String, calendar: CalendarId },
    Skipped(SkipReason),
}

impl VariantOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VariantOutcome::Accepted { .. })
    }
}

/// Output of a finished run, ready to be written as GTFS.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConvertedCalendars {
    pub calendar: Vec<CalendarRow>,
    pub calendar_dates: Vec<CalendarDateRow>,
    pub trips: Vec<TripServiceRow>,
}

/// Per-run conversion context.
#[derive(Debug, Default)]
pub struct ConversionRun {
    registry: CalendarRegistry,
    coverage: HashMap<String, BTreeSet<NaiveDate>>,
    trips: Vec<(String, CalendarId)>,
}

impl ConversionRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a variant to the run.
    ///
    /// Variants that cannot become trips are skipped with a warning. Only a
    /// fatal calendar error (see [`CalendarFormatError::is_fatal`]) is
    /// returned as `Err`, and the caller should abandon the run.
    pub fn add_variant(
        &mut self,
        variant: &TrainVariant,
    ) -> Result<VariantOutcome, CalendarFormatError> {
        let trip_id = variant.trip_id();

        // feed corruption aborts the run even for variants skipped below
        let calendar = match variant.calendar() {
            Err(e) if e.is_fatal() => return Err(e),
            other => other,
        };

        if variant.stop_count < MIN_STOPS {
            debug!(
                trip_id = %trip_id,
                stops = variant.stop_count,
                "Skipping variant with too few stops"
            );
            return Ok(VariantOutcome::Skipped(SkipReason::TooFewStops(
                variant.stop_count,
            )));
        }

        let calendar = match calendar {
            Ok(calendar) => calendar,
            Err(e) => {
                warn!(trip_id = %trip_id, error = %e, "Skipping variant with malformed calendar");
                return Ok(VariantOutcome::Skipped(SkipReason::Malformed(e)));
            }
        };

        let claimed = self.coverage.entry(variant.core_id.clone()).or_default();
        let overlap: BTreeSet<NaiveDate> = calendar
            .active_dates()
            .intersection(claimed)
            .copied()
            .collect();
        if !overlap.is_empty() {
            warn!(
                core_id = %variant.core_id,
                variant = %variant.variant,
                overlap = ?overlap,
                "Overlapping calendars for variants of one core id"
            );
            return Ok(VariantOutcome::Skipped(SkipReason::Overlap { dates: overlap }));
        }
        claimed.extend(calendar.active_dates().iter().copied());

        let id = self.registry.intern(calendar);
        self.trips.push((trip_id.clone(), id));
        Ok(VariantOutcome::Accepted {
            trip_id,
            calendar: id,
        })
    }

    pub fn registry(&self) -> &CalendarRegistry {
        &self.registry
    }

    /// Accepted trips so far, in the order they were added.
    pub fn trips(&self) -> &[(String, CalendarId)] {
        &self.trips
    }

    pub fn finish(self) -> ConvertedCalendars {
        let (calendar, calendar_dates) = self.registry.gtfs_rows();
        let trips = self
            .trips
            .into_iter()
            .map(|(trip_id, id)| TripServiceRow {
                trip_id,
                service_id: id.to_string(),
            })
            .collect();
        ConvertedCalendars {
            calendar,
            calendar_dates,
            trips,
        }
    }
}
