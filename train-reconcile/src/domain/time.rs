//! Service-day time handling.
//!
//! Timetable feeds give stop times as "HH:MM" or "HH:MM:SS" strings measured
//! from midnight of the service day. Times after midnight are written with
//! hours >= 24 (e.g. "24:30:00"), so a time-of-day alone is not enough.

use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveTime, Timelike};
use regex::Regex;

/// First `H:MM` or `HH:MM` occurrence in free text.
static HHMM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2}):([0-5]\d)\b").expect("valid HH:MM regex"));

const SECS_PER_DAY: u32 = 24 * 60 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time measured from midnight of the service day.
///
/// Unlike `NaiveTime`, values of 24:00 and later are allowed, so a trip
/// leaving at 23:50 and arriving at 00:20 the next morning keeps increasing
/// times.
///
/// # Examples
///
/// ```
/// use train_reconcile::domain::DayTime;
///
/// let t = DayTime::parse("24:30:00").unwrap();
/// assert_eq!(t.to_string(), "24:30");
/// assert_eq!(t.gtfs(), "24:30:00");
///
/// let first = DayTime::extract("10:14 / 10:19").unwrap();
/// assert_eq!(first.to_string(), "10:14");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayTime(u32);

impl DayTime {
    /// Build from hour/minute/second components. Hours may exceed 23.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        if minute > 59 || second > 59 {
            return None;
        }
        Some(Self(hour * 3600 + minute * 60 + second))
    }

    /// Time-of-day on the service day itself.
    pub fn from_naive(time: NaiveTime) -> Self {
        Self(time.num_seconds_from_midnight())
    }

    /// Parse "H:MM", "HH:MM" or "HH:MM:SS" (hours up to 99).
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();
        let mut parts = s.split(':');

        let hour = parts
            .next()
            .filter(|h| (1..=2).contains(&h.len()))
            .and_then(parse_digits)
            .ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minute = parts
            .next()
            .filter(|m| m.len() == 2)
            .and_then(parse_digits)
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        let second = match parts.next() {
            None => 0,
            Some(sec) if sec.len() == 2 => {
                parse_digits(sec).ok_or_else(|| TimeError::new("invalid second digits"))?
            }
            Some(_) => return Err(TimeError::new("invalid second digits")),
        };
        if parts.next().is_some() {
            return Err(TimeError::new("expected at most three fields"));
        }

        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        Ok(Self(hour * 3600 + minute * 60 + second))
    }

    /// Find the first "H:MM"/"HH:MM" in free text, at minute precision.
    ///
    /// Labels scraped from departure boards mix times with other text
    /// ("10:14 / 10:19", "dep. 7:05"). Seconds are never extracted.
    pub fn extract(text: &str) -> Option<Self> {
        let caps = HHMM_RE.captures(text)?;
        let hour = caps.get(1).and_then(|m| parse_digits(m.as_str()))?;
        let minute = caps.get(2).and_then(|m| parse_digits(m.as_str()))?;
        Self::from_hms(hour, minute, 0)
    }

    /// Seconds since service-day midnight.
    pub fn seconds(&self) -> u32 {
        self.0
    }

    /// Whole minutes since service-day midnight.
    pub fn total_minutes(&self) -> u32 {
        self.0 / 60
    }

    /// Hours since service-day midnight (may exceed 23).
    pub fn hour(&self) -> u32 {
        self.0 / 3600
    }

    pub fn minute(&self) -> u32 {
        (self.0 / 60) % 60
    }

    pub fn second(&self) -> u32 {
        self.0 % 60
    }

    /// Drop the seconds component.
    pub fn truncate_to_minute(&self) -> Self {
        Self(self.0 - self.second())
    }

    /// Absolute distance in whole minutes.
    pub fn minutes_between(&self, other: DayTime) -> u32 {
        self.total_minutes().abs_diff(other.total_minutes())
    }

    /// Shift by one day (used for after-midnight encoding).
    pub fn next_day(&self) -> Self {
        Self(self.0 + SECS_PER_DAY)
    }

    /// GTFS rendering: unpadded hours, e.g. "7:05:00" or "25:10:00".
    pub fn gtfs(&self) -> String {
        format!("{}:{:02}:{:02}", self.hour(), self.minute(), self.second())
    }
}

impl fmt::Debug for DayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DayTime({:02}:{:02}:{:02})",
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

impl fmt::Display for DayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Parse a run of ASCII digits into a u32.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Convert a trip's times-of-day into service-day times.
///
/// Source timetables give plain times of day in travel order. The first time
/// a value goes backwards we assume the trip crossed midnight; that time and
/// every later one is moved to the next day. Only one crossing is detected,
/// which covers every passenger train that runs for less than 24 hours.
///
/// # Examples
///
/// ```
/// use train_reconcile::domain::unroll_midnight;
/// use chrono::NaiveTime;
///
/// let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
/// let unrolled = unroll_midnight(&[t(23, 40), t(23, 55), t(0, 10)]);
/// let rendered: Vec<_> = unrolled.iter().map(|d| d.gtfs()).collect();
/// assert_eq!(rendered, ["23:40:00", "23:55:00", "24:10:00"]);
/// ```
pub fn unroll_midnight(times: &[NaiveTime]) -> Vec<DayTime> {
    let mut result = Vec::with_capacity(times.len());
    let mut prev: Option<NaiveTime> = None;
    let mut crossed = false;

    for &time in times {
        if let Some(prev) = prev {
            if !crossed && time < prev {
                crossed = true;
            }
        }
        let day_time = DayTime::from_naive(time);
        result.push(if crossed { day_time.next_day() } else { day_time });
        prev = Some(time);
    }

    result
}
