//! A yield term structure with a constant forward rate
//! (translates `ql/termstructures/yield/flatforward.hpp`).
//!
//! The rate is read from a quote on every call, so moving the quote moves the
//! curve; observers of the curve are notified when the quote changes.

use crate::term_structure::TermStructure;
use crate::yield_term_structure::{YieldTermStructure, YieldTermStructureData};
use ql_core::errors::{Error, Result};
use ql_core::patterns::observable::{register_with, Observable, ObservableImpl, Observer};
use ql_core::{Rate, Time};
use ql_quotes::{Quote, SimpleQuote};
use ql_time::{Date, DayCounter};
use std::sync::{Arc, Weak};

/// A flat, continuously-compounded yield term structure.
///
/// Corresponds to `QuantLib::FlatForward` with `Continuous` compounding.
#[derive(Debug)]
pub struct FlatForward {
    data: YieldTermStructureData,
    rate: Arc<SimpleQuote>,
    observable: ObservableImpl,
}

impl FlatForward {
    /// Create a flat curve driven by `rate` and register it with the quote.
    pub fn new(
        reference_date: Date,
        rate: Arc<SimpleQuote>,
        day_counter: impl DayCounter + 'static,
    ) -> Arc<Self> {
        let curve = Arc::new(Self {
            data: YieldTermStructureData::new(reference_date, day_counter),
            rate,
            observable: ObservableImpl::new(),
        });
        register_with(&curve, curve.rate.as_ref());
        curve
    }

    /// The quote driving this curve.
    pub fn rate(&self) -> &Arc<SimpleQuote> {
        &self.rate
    }
}

impl TermStructure for FlatForward {
    fn reference_date(&self) -> Date {
        self.data.reference_date
    }

    fn day_counter(&self) -> &dyn DayCounter {
        &*self.data.day_counter
    }

    fn max_date(&self) -> Date {
        Date::MAX
    }
}

impl YieldTermStructure for FlatForward {
    fn zero_rate_impl(&self, _t: Time) -> Result<Rate> {
        self.rate.value().ok_or(Error::NullValue)
    }
}

impl Observer for FlatForward {
    fn update(&self) {
        self.observable.notify();
    }
}

impl Observable for FlatForward {
    fn register_observer(&self, observer: Weak<dyn Observer>) {
        self.observable.register(observer);
    }

    fn unregister_observer(&self, observer: &Weak<dyn Observer>) {
        self.observable.unregister(observer);
    }

    fn notify_observers(&self) {
        self.observable.notify();
    }
}
