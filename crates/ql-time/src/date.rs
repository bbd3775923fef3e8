//! `Date` type (translates `ql/time/date.hpp`).
//!
//! Calendar arithmetic is delegated to `chrono::NaiveDate`; this newtype only
//! exposes what term structures need: construction from year/month/day, day
//! offsets, day differences, ordering and QuantLib-style formatting.

use chrono::{Datelike, Days, NaiveDate};
use ql_core::errors::{Error, Result};

/// A calendar date.
///
/// Corresponds to `QuantLib::Date`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(NaiveDate);

impl Date {
    /// Latest representable date.
    pub const MAX: Date = Date(NaiveDate::MAX);

    /// Create a date from year, month (1–12), and day-of-month (1–31).
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| Error::Date(format!("invalid date {year:04}-{month:02}-{day:02}")))
    }

    /// Year.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month (1–12).
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Day of the month (1–31).
    pub fn day_of_month(&self) -> u32 {
        self.0.day()
    }

    /// The date `n` calendar days later (earlier if `n` is negative).
    pub fn add_days(self, n: i64) -> Result<Self> {
        let shifted = if n >= 0 {
            self.0.checked_add_days(Days::new(n.unsigned_abs()))
        } else {
            self.0.checked_sub_days(Days::new(n.unsigned_abs()))
        };
        shifted
            .map(Self)
            .ok_or_else(|| Error::Date(format!("{self} shifted by {n} days is out of range")))
    }

    /// Number of calendar days from `self` to `other` (positive if `other`
    /// is later).
    pub fn days_between(self, other: Date) -> i64 {
        other.0.signed_duration_since(self.0).num_days()
    }

    /// The underlying `chrono` date.
    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for Date {
    fn from(d: NaiveDate) -> Self {
        Self(d)
    }
}

impl std::ops::Sub<Date> for Date {
    type Output = i64;
    fn sub(self, rhs: Date) -> i64 {
        rhs.days_between(self)
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%B %-d, %Y"))
    }
}

impl std::fmt::Debug for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Date({})", self.0.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_and_fields() {
        let d = Date::from_ymd(2025, 3, 31).unwrap();
        assert_eq!(d.year(), 2025);
        assert_eq!(d.month(), 3);
        assert_eq!(d.day_of_month(), 31);
    }

    #[test]
    fn invalid_date_is_rejected() {
        assert!(matches!(Date::from_ymd(2025, 2, 29), Err(Error::Date(_))));
        assert!(Date::from_ymd(2024, 2, 29).is_ok());
    }

    #[test]
    fn day_offsets() {
        let d = Date::from_ymd(2024, 12, 30).unwrap();
        let later = d.add_days(3).unwrap();
        assert_eq!(later, Date::from_ymd(2025, 1, 2).unwrap());
        assert_eq!(later.add_days(-3).unwrap(), d);
        assert_eq!(d.days_between(later), 3);
        assert_eq!(later - d, 3);
    }

    #[test]
    fn formatting() {
        let d = Date::from_ymd(2025, 1, 2).unwrap();
        assert_eq!(d.to_string(), "January 2, 2025");
        assert_eq!(format!("{d:?}"), "Date(2025-01-02)");
    }
}
