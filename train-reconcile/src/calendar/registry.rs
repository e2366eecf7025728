//! Per-run calendar interning.
//!
//! Many trip variants in a feed run on exactly the same dates. Each distinct
//! active-date set is stored once and handed out as a [`CalendarId`]; the id's
//! index is also the numeric service id written to the output, so ids stay
//! stable no matter when the caller asks for them.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;

use super::gtfs::{CalendarDateRow, CalendarRow, gtfs_date};
use super::service::{ServiceCalendar, parse_validity_timestamp};
use crate::domain::CalendarFormatError;

/// Handle to a calendar interned in a [`CalendarRegistry`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarId(usize);

impl CalendarId {
    /// Position in registry order, used as the output service id.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for CalendarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CalendarId({})", self.0)
    }
}

impl fmt::Display for CalendarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Calendars of one conversion run, deduplicated by active-date set.
///
/// Two calendars whose active dates are identical share one entry even if
/// their validity periods differ; the first one registered wins.
#[derive(Debug, Default)]
pub struct CalendarRegistry {
    calendars: Vec<ServiceCalendar>,
    by_dates: HashMap<BTreeSet<NaiveDate>, CalendarId>,
}

impl CalendarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a calendar, returning the existing handle if its active-date
    /// set has been seen before.
    pub fn intern(&mut self, calendar: ServiceCalendar) -> CalendarId {
        if let Some(id) = self.by_dates.get(calendar.active_dates()) {
            return *id;
        }
        let id = CalendarId(self.calendars.len());
        self.by_dates.insert(calendar.active_dates().clone(), id);
        self.calendars.push(calendar);
        id
    }

    /// Build a calendar from a bitmap and intern it.
    pub fn build_calendar(
        &mut self,
        bitmap: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<CalendarId, CalendarFormatError> {
        let calendar = ServiceCalendar::from_bitmap(bitmap, start, end)?;
        Ok(self.intern(calendar))
    }

    /// Build from raw validity timestamps (`YYYY-MM-DDT00:00:00`).
    pub fn build_from_raw(
        &mut self,
        bitmap: &str,
        start: &str,
        end: Option<&str>,
    ) -> Result<CalendarId, CalendarFormatError> {
        let start = parse_validity_timestamp(start)?;
        let end = end.map(parse_validity_timestamp).transpose()?;
        self.build_calendar(bitmap, start, end)
    }

    pub fn get(&self, id: CalendarId) -> Option<&ServiceCalendar> {
        self.calendars.get(id.0)
    }

    /// Look up the handle for an exact active-date set.
    pub fn find(&self, active_dates: &BTreeSet<NaiveDate>) -> Option<CalendarId> {
        self.by_dates.get(active_dates).copied()
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    /// Calendars in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (CalendarId, &ServiceCalendar)> {
        self.calendars
            .iter()
            .enumerate()
            .map(|(idx, cal)| (CalendarId(idx), cal))
    }

    /// GTFS `calendar.txt` and `calendar_dates.txt` rows for every
    /// calendar, using the inferred weekly pattern of each.
    pub fn gtfs_rows(&self) -> (Vec<CalendarRow>, Vec<CalendarDateRow>) {
        let mut calendar = Vec::with_capacity(self.calendars.len());
        let mut calendar_dates = Vec::new();

        for (id, cal) in self.iter() {
            let service_id = id.to_string();
            let regular = cal.guess_weekdays();
            calendar.push(CalendarRow::from_pattern(
                service_id.clone(),
                regular,
                cal.start(),
                cal.end(),
            ));
            calendar_dates.extend(cal.exceptions(Some(regular)).into_iter().map(|exc| {
                CalendarDateRow {
                    service_id: service_id.clone(),
                    date: gtfs_date(exc.date),
                    exception_type: exc.kind.gtfs_code(),
                }
            }));
        }

        (calendar, calendar_dates)
    }
}

/// A registry that can be shared between threads building calendars.
///
/// Lookups and inserts are serialized by a mutex. Contention is low because
/// building a calendar happens outside the lock; only the interning step
/// takes it.
#[derive(Debug, Clone, Default)]
pub struct SharedCalendarRegistry {
    inner: Arc<Mutex<CalendarRegistry>>,
}

impl SharedCalendarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, calendar: ServiceCalendar) -> CalendarId {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.intern(calendar)
    }

    pub fn build_calendar(
        &self,
        bitmap: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<CalendarId, CalendarFormatError> {
        let calendar = ServiceCalendar::from_bitmap(bitmap, start, end)?;
        Ok(self.intern(calendar))
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the registry back once all builders are done.
    ///
    /// Fails (returning `self`) while other clones are still alive.
    pub fn into_inner(self) -> Result<CalendarRegistry, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(PoisonError::into_inner)),
            Err(inner) => Err(Self { inner }),
        }
    }
}
