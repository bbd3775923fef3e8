//! Base trait for all term structures
//! (translates `ql/termstructure.hpp`).
//!
//! Every term structure has a **reference date**, a **day counter**, and a
//! **maximum date**. Term structures are observable: they notify their
//! observers whenever one of their inputs changes.

use ql_core::patterns::observable::Observable;
use ql_core::Time;
use ql_time::{Date, DayCounter};

/// Base trait for all term structures.
///
/// Corresponds to `QuantLib::TermStructure`.
pub trait TermStructure: Observable + std::fmt::Debug + Send + Sync {
    /// The date at which discount = 1.0 and from which time is measured.
    fn reference_date(&self) -> Date;

    /// The day counter used for date → time-fraction conversions.
    fn day_counter(&self) -> &dyn DayCounter;

    /// The latest date for which the curve can be used.
    fn max_date(&self) -> Date;

    /// The latest time for which the curve can be used.
    fn max_time(&self) -> Time {
        self.time_from_reference(self.max_date())
    }

    /// Convert a date to a year fraction relative to the reference date.
    fn time_from_reference(&self, date: Date) -> Time {
        self.day_counter()
            .year_fraction(self.reference_date(), date)
    }
}
