//! Yield (interest-rate) term structures
//! (translates `ql/termstructures/yieldtermstructure.hpp`).
//!
//! Every quantity is continuously compounded. Curves that compute lazily may
//! fail when queried, so the public accessors return `Result`.

use crate::piecewise_yield_curve::BootstrappedCurve;
use crate::term_structure::TermStructure;
use ql_core::errors::Result;
use ql_core::{DiscountFactor, Rate, Time};
use ql_time::{Date, DayCounter};
use std::sync::Arc;

/// A yield (interest-rate) term structure.
///
/// Implementors provide **one** of the two low-level hooks; the other is
/// derived from `P(t) = exp(-z(t) t)`.
///
/// Corresponds to `QuantLib::YieldTermStructure`.
pub trait YieldTermStructure: TermStructure {
    /// Discount factor for time `t`.
    fn discount_impl(&self, t: Time) -> Result<DiscountFactor> {
        if t == 0.0 {
            return Ok(1.0);
        }
        Ok((-self.zero_rate_impl(t)? * t).exp())
    }

    /// Continuously-compounded zero rate for time `t`.
    fn zero_rate_impl(&self, t: Time) -> Result<Rate> {
        let t = t.max(DT);
        Ok(-self.discount_impl(t)?.ln() / t)
    }

    /// Bootstrapped-curve view of this term structure, if it is one.
    ///
    /// Components that need the pillar structure (node dates and the
    /// calibrating instruments) ask for this capability instead of
    /// downcasting.
    fn as_bootstrapped(&self) -> Option<&dyn BootstrappedCurve> {
        None
    }

    // ── Public interface ─────────────────────────────────────────────────

    /// Discount factor for a time.
    fn discount(&self, t: Time) -> Result<DiscountFactor> {
        self.discount_impl(t)
    }

    /// Discount factor for a date.
    fn discount_date(&self, date: Date) -> Result<DiscountFactor> {
        self.discount_impl(self.time_from_reference(date))
    }

    /// Continuously-compounded zero rate for time `t`.
    fn zero_rate(&self, t: Time) -> Result<Rate> {
        self.zero_rate_impl(t)
    }

    /// Continuously-compounded zero rate to `date`.
    fn zero_rate_date(&self, date: Date) -> Result<Rate> {
        self.zero_rate_impl(self.time_from_reference(date))
    }

    /// Continuously-compounded forward rate between `t1` and `t2`.
    fn forward_rate(&self, t1: Time, t2: Time) -> Result<Rate> {
        let (t1, t2) = if t2 - t1 < DT { (t1, t1 + DT) } else { (t1, t2) };
        Ok((self.discount_impl(t1)? / self.discount_impl(t2)?).ln() / (t2 - t1))
    }
}

/// Small time step used for instantaneous quantities.
const DT: Time = 1.0e-4;

/// Common data shared by yield-curve implementations.
#[derive(Debug, Clone)]
pub struct YieldTermStructureData {
    /// Reference date.
    pub reference_date: Date,
    /// Day counter for time calculations.
    pub day_counter: Arc<dyn DayCounter>,
}

impl YieldTermStructureData {
    /// Create a new data bundle.
    pub fn new(reference_date: Date, day_counter: impl DayCounter + 'static) -> Self {
        Self {
            reference_date,
            day_counter: Arc::new(day_counter),
        }
    }
}
