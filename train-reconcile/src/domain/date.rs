//! Calendar date and weekday helpers.
//!
//! Weekdays are numbered Monday = 0 through Sunday = 6 throughout the crate,
//! matching `chrono::Weekday::num_days_from_monday`.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// All seven weekdays in Monday-first order.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Returns the date `offset` days after `start`.
///
/// Returns `None` only if the result overflows chrono's date range.
///
/// # Examples
///
/// ```
/// use train_reconcile::domain::date_at_offset;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
/// assert_eq!(
///     date_at_offset(start, 3),
///     NaiveDate::from_ymd_opt(2025, 1, 2)
/// );
/// ```
pub fn date_at_offset(start: NaiveDate, offset: u64) -> Option<NaiveDate> {
    start.checked_add_days(Days::new(offset))
}

/// Monday-based weekday index (0 = Monday, 6 = Sunday).
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// Iterate every date in the inclusive range `[start, end]`.
///
/// Yields nothing if `end < start`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// A set of weekdays, stored as a 7-bit mask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Every day of the week.
    pub const ALL: Self = Self(0b111_1111);

    /// Monday to Friday.
    pub const WORKDAYS: Self = Self(0b001_1111);

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }

    /// Set containing a single weekday.
    pub fn single(day: Weekday) -> Self {
        Self(Self::bit(day))
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True if the two sets share at least one weekday.
    pub fn intersects(&self, other: WeekdaySet) -> bool {
        self.0 & other.0 != 0
    }

    /// Members in Monday-first order.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        let set = *self;
        WEEKDAYS.into_iter().filter(move |d| set.contains(*d))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn offset_crosses_month_and_year() {
        assert_eq!(date_at_offset(date(2024, 2, 28), 1), Some(date(2024, 2, 29)));
        assert_eq!(date_at_offset(date(2024, 2, 28), 2), Some(date(2024, 3, 1)));
        assert_eq!(date_at_offset(date(2024, 12, 31), 1), Some(date(2025, 1, 1)));
        assert_eq!(date_at_offset(date(2024, 12, 31), 0), Some(date(2024, 12, 31)));
    }

    #[test]
    fn weekday_index_is_monday_based() {
        // 2024-12-16 was a Monday
        assert_eq!(weekday_index(date(2024, 12, 16)), 0);
        assert_eq!(weekday_index(date(2024, 12, 21)), 5);
        assert_eq!(weekday_index(date(2024, 12, 22)), 6);
    }

    #[test]
    fn days_inclusive_bounds() {
        let days: Vec<_> = days_inclusive(date(2024, 1, 30), date(2024, 2, 2)).collect();
        assert_eq!(
            days,
            vec![date(2024, 1, 30), date(2024, 1, 31), date(2024, 2, 1), date(2024, 2, 2)]
        );
        assert_eq!(days_inclusive(date(2024, 1, 1), date(2024, 1, 1)).count(), 1);
        assert_eq!(days_inclusive(date(2024, 1, 2), date(2024, 1, 1)).count(), 0);
    }

    #[test]
    fn weekday_set_operations() {
        let mut set = WeekdaySet::EMPTY;
        assert!(set.is_empty());
        set.insert(Weekday::Sat);
        set.insert(Weekday::Mon);
        set.insert(Weekday::Sat);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Weekday::Mon));
        assert!(!set.contains(Weekday::Sun));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Weekday::Mon, Weekday::Sat]);
        assert!(set.intersects(WeekdaySet::WORKDAYS));
        assert!(!WeekdaySet::single(Weekday::Sun).intersects(WeekdaySet::WORKDAYS));
        assert_eq!(WeekdaySet::ALL.len(), 7);
        assert_eq!(WEEKDAYS.into_iter().collect::<WeekdaySet>(), WeekdaySet::ALL);
    }

    #[test]
    fn weekday_set_debug() {
        let set: WeekdaySet = [Weekday::Tue, Weekday::Fri].into_iter().collect();
        assert_eq!(format!("{:?}", set), "{Tue, Fri}");
    }
}
