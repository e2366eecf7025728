//! GTFS-shaped calendar rows.
//!
//! These are what the calendar engine hands back to the caller for writing,
//! and also what the reconciler reads back from an existing feed.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::WeekdaySet;

/// Format a date as GTFS `YYYYMMDD`.
pub fn gtfs_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Parse a GTFS `YYYYMMDD` date.
pub fn parse_gtfs_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").ok()
}

/// One row of `calendar.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRow {
    pub service_id: String,
    #[serde(default)]
    pub monday: u8,
    #[serde(default)]
    pub tuesday: u8,
    #[serde(default)]
    pub wednesday: u8,
    #[serde(default)]
    pub thursday: u8,
    #[serde(default)]
    pub friday: u8,
    #[serde(default)]
    pub saturday: u8,
    #[serde(default)]
    pub sunday: u8,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

impl CalendarRow {
    /// Row for a weekly pattern over `[start, end]`.
    pub fn from_pattern(
        service_id: String,
        regular: WeekdaySet,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        let flag = |day| u8::from(regular.contains(day));
        Self {
            service_id,
            monday: flag(Weekday::Mon),
            tuesday: flag(Weekday::Tue),
            wednesday: flag(Weekday::Wed),
            thursday: flag(Weekday::Thu),
            friday: flag(Weekday::Fri),
            saturday: flag(Weekday::Sat),
            sunday: flag(Weekday::Sun),
            start_date: gtfs_date(start),
            end_date: gtfs_date(end),
        }
    }

    /// Weekdays flagged `1`.
    pub fn weekdays(&self) -> WeekdaySet {
        [
            (self.monday, Weekday::Mon),
            (self.tuesday, Weekday::Tue),
            (self.wednesday, Weekday::Wed),
            (self.thursday, Weekday::Thu),
            (self.friday, Weekday::Fri),
            (self.saturday, Weekday::Sat),
            (self.sunday, Weekday::Sun),
        ]
        .into_iter()
        .filter(|(flag, _)| *flag == 1)
        .map(|(_, day)| day)
        .collect()
    }
}

/// One row of `calendar_dates.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDateRow {
    pub service_id: String,
    pub date: String,
    /// 1 = service added, 2 = service removed
    pub exception_type: u8,
}

impl CalendarDateRow {
    /// Weekday of an added date, if this row adds service on a valid date.
    pub fn added_weekday(&self) -> Option<Weekday> {
        if self.exception_type != 1 {
            return None;
        }
        parse_gtfs_date(&self.date).map(|d| d.weekday())
    }
}

/// Links an output trip to the service id of its calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripServiceRow {
    pub trip_id: String,
    pub service_id: String,
}
