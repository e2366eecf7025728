//! Service calendars built from day-activity bitmaps.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use crate::domain::{CalendarFormatError, WEEKDAYS, WeekdaySet, date_at_offset, days_inclusive};

/// Time suffix every validity timestamp must carry.
const MIDNIGHT_SUFFIX: &str = "T00:00:00";

/// Parse a validity-period timestamp such as `2024-12-15T00:00:00`.
///
/// Calendars are whole days, so anything other than exactly midnight is
/// rejected rather than silently truncated.
///
/// # Examples
///
/// ```
/// use train_reconcile::calendar::parse_validity_timestamp;
/// use chrono::NaiveDate;
///
/// assert_eq!(
///     parse_validity_timestamp("2024-12-15T00:00:00").unwrap(),
///     NaiveDate::from_ymd_opt(2024, 12, 15).unwrap()
/// );
/// assert!(parse_validity_timestamp("2024-12-15T06:00:00").is_err());
/// assert!(parse_validity_timestamp("2024-12-15").is_err());
/// ```
pub fn parse_validity_timestamp(value: &str) -> Result<NaiveDate, CalendarFormatError> {
    let invalid = |reason| CalendarFormatError::InvalidTimestamp {
        value: value.to_string(),
        reason,
    };
    let trimmed = value.trim();
    let date_part = trimmed
        .strip_suffix(MIDNIGHT_SUFFIX)
        .ok_or_else(|| invalid("expected a date at T00:00:00"))?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| invalid("invalid date"))
}

/// Whether a date was added to or removed from the weekly pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    /// Service runs although its weekday is not regular
    Added,
    /// Service does not run although its weekday is regular
    Removed,
}

impl ExceptionKind {
    /// GTFS `calendar_dates.txt` exception_type value.
    pub fn gtfs_code(&self) -> u8 {
        match self {
            ExceptionKind::Added => 1,
            ExceptionKind::Removed => 2,
        }
    }

    /// Inverse of [`ExceptionKind::gtfs_code`].
    pub fn from_gtfs_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ExceptionKind::Added),
            2 => Some(ExceptionKind::Removed),
            _ => None,
        }
    }
}

/// A single date where actual service disagrees with the weekly pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarException {
    pub date: NaiveDate,
    pub kind: ExceptionKind,
}

/// The set of dates on which a trip variant runs.
///
/// Built from a bitmap of `'0'`/`'1'` characters, one per day starting at
/// the validity start. The end of validity is always
/// `start + (bitmap length - 1)` days, and every active date lies within
/// `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCalendar {
    start: NaiveDate,
    end: NaiveDate,
    active_dates: BTreeSet<NaiveDate>,
    bitmap_len: usize,
}

impl ServiceCalendar {
    /// Build a calendar from its bitmap and validity bounds.
    ///
    /// A single-day bitmap needs no end; if one is supplied anyway it must
    /// equal `start`. Longer bitmaps require an end that matches their
    /// length exactly.
    ///
    /// # Examples
    ///
    /// ```
    /// use train_reconcile::calendar::ServiceCalendar;
    /// use chrono::NaiveDate;
    ///
    /// let start = NaiveDate::from_ymd_opt(2024, 12, 16).unwrap();
    /// let end = NaiveDate::from_ymd_opt(2024, 12, 22).unwrap();
    /// let cal = ServiceCalendar::from_bitmap("1111100", start, Some(end)).unwrap();
    /// assert_eq!(cal.active_dates().len(), 5);
    /// assert_eq!(cal.end(), end);
    /// ```
    pub fn from_bitmap(
        bitmap: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<Self, CalendarFormatError> {
        let bitmap = bitmap.trim();
        let days = bitmap.chars().count();
        if days == 0 {
            return Err(CalendarFormatError::EmptyBitmap);
        }

        let expected_end = date_at_offset(start, days as u64 - 1).ok_or_else(|| {
            CalendarFormatError::InvalidTimestamp {
                value: start.to_string(),
                reason: "validity period overflows the calendar",
            }
        })?;

        match end {
            Some(found) if found != expected_end => {
                return Err(CalendarFormatError::EndMismatch {
                    expected: expected_end,
                    found,
                });
            }
            None if days > 1 => return Err(CalendarFormatError::MissingEnd { days }),
            _ => {}
        }

        let mut active_dates = BTreeSet::new();
        for (offset, c) in bitmap.chars().enumerate() {
            match c {
                '1' => {
                    // offset < days, so this cannot exceed expected_end
                    if let Some(date) = date_at_offset(start, offset as u64) {
                        active_dates.insert(date);
                    }
                }
                '0' => {}
                found => return Err(CalendarFormatError::InvalidBitmapChar { offset, found }),
            }
        }

        Ok(Self {
            start,
            end: expected_end,
            active_dates,
            bitmap_len: days,
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn bitmap_len(&self) -> usize {
        self.bitmap_len
    }

    /// Dates on which the service runs, in ascending order.
    pub fn active_dates(&self) -> &BTreeSet<NaiveDate> {
        &self.active_dates
    }

    pub fn is_active(&self, date: NaiveDate) -> bool {
        self.active_dates.contains(&date)
    }

    /// Every date of the validity period, active or not.
    pub fn service_interval(&self) -> impl Iterator<Item = NaiveDate> {
        days_inclusive(self.start, self.end)
    }

    /// Weekdays on which the service runs at least once.
    pub fn active_weekdays(&self) -> WeekdaySet {
        self.active_dates.iter().map(|d| d.weekday()).collect()
    }

    /// Infer the regular weekly pattern.
    ///
    /// A weekday is regular when it is active on strictly more of its
    /// occurrences in the validity period than it is inactive. A tie is not
    /// regular.
    pub fn guess_weekdays(&self) -> WeekdaySet {
        let mut active = [0u32; 7];
        let mut inactive = [0u32; 7];
        for date in self.service_interval() {
            let idx = date.weekday().num_days_from_monday() as usize;
            if self.is_active(date) {
                active[idx] += 1;
            } else {
                inactive[idx] += 1;
            }
        }

        WEEKDAYS
            .into_iter()
            .filter(|wd| {
                let idx = wd.num_days_from_monday() as usize;
                active[idx] > inactive[idx]
            })
            .collect()
    }

    /// Dates that disagree with a weekly pattern, in ascending order.
    ///
    /// With `None` the pattern from [`ServiceCalendar::guess_weekdays`] is
    /// used.
    pub fn exceptions(&self, regular: Option<WeekdaySet>) -> Vec<CalendarException> {
        let regular = regular.unwrap_or_else(|| self.guess_weekdays());
        self.service_interval()
            .filter_map(|date| {
                let active = self.is_active(date);
                let expected = regular.contains(date.weekday());
                match (active, expected) {
                    (true, false) => Some(CalendarException {
                        date,
                        kind: ExceptionKind::Added,
                    }),
                    (false, true) => Some(CalendarException {
                        date,
                        kind: ExceptionKind::Removed,
                    }),
                    _ => None,
                }
            })
            .collect()
    }
}

/// Replay a weekly pattern plus exceptions into the dates it describes.
///
/// This is the inverse of [`ServiceCalendar::guess_weekdays`] and
/// [`ServiceCalendar::exceptions`]: applying a calendar's own pattern and
/// exceptions reproduces its active dates exactly. Exceptions outside
/// `[start, end]` are ignored.
pub fn expand_pattern(
    start: NaiveDate,
    end: NaiveDate,
    regular: WeekdaySet,
    exceptions: &[CalendarException],
) -> BTreeSet<NaiveDate> {
    let mut dates: BTreeSet<NaiveDate> = days_inclusive(start, end)
        .filter(|d| regular.contains(d.weekday()))
        .collect();
    for exception in exceptions {
        if exception.date < start || exception.date > end {
            continue;
        }
        match exception.kind {
            ExceptionKind::Added => {
                dates.insert(exception.date);
            }
            ExceptionKind::Removed => {
                dates.remove(&exception.date);
            }
        }
    }
    dates
}
