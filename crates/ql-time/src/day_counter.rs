//! `DayCounter` trait and the actual-day conventions (translates
//! `ql/time/daycounter.hpp` and `ql/time/daycounters/actual*.hpp`).
//!
//! A day counter computes the fraction of a year between two dates, used to
//! turn pillar dates into curve times.

use crate::date::Date;
use ql_core::{Real, Time};

/// A convention for counting the fraction of a year between two dates.
///
/// Corresponds to `QuantLib::DayCounter`.
pub trait DayCounter: std::fmt::Debug + Send + Sync {
    /// Human-readable name of this convention (e.g. `"Actual/365 (Fixed)"`).
    fn name(&self) -> &str;

    /// Number of days between `d1` and `d2` according to this convention.
    fn day_count(&self, d1: Date, d2: Date) -> i64 {
        d1.days_between(d2)
    }

    /// Fraction of a year between `d1` and `d2`.
    fn year_fraction(&self, d1: Date, d2: Date) -> Time;
}

/// Actual/365 (Fixed): `actual_days / 365`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Actual365Fixed;

impl DayCounter for Actual365Fixed {
    fn name(&self) -> &str {
        "Actual/365 (Fixed)"
    }

    fn year_fraction(&self, d1: Date, d2: Date) -> Time {
        self.day_count(d1, d2) as Real / 365.0
    }
}

/// Actual/360: `actual_days / 360`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Actual360;

impl DayCounter for Actual360 {
    fn name(&self) -> &str {
        "Actual/360"
    }

    fn year_fraction(&self, d1: Date, d2: Date) -> Time {
        self.day_count(d1, d2) as Real / 360.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn actual_conventions() {
        let d1 = Date::from_ymd(2025, 1, 2).unwrap();
        let d2 = Date::from_ymd(2026, 1, 2).unwrap();
        assert_eq!(Actual365Fixed.day_count(d1, d2), 365);
        assert_abs_diff_eq!(Actual365Fixed.year_fraction(d1, d2), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(Actual360.year_fraction(d1, d2), 365.0 / 360.0, epsilon = 1e-15);
        assert_abs_diff_eq!(Actual360.year_fraction(d2, d1), -365.0 / 360.0, epsilon = 1e-15);
    }
}
