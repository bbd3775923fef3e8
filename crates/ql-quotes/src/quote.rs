//! `Quote` trait and `SimpleQuote` implementation.
//!
//! Translates `ql/quote.hpp` and `ql/quotes/simplequote.hpp`.

use ql_core::patterns::observable::{Observable, ObservableImpl, Observer};
use ql_core::Real;
use std::sync::{Mutex, PoisonError, Weak};

/// A market-observable value.
///
/// Corresponds to `QuantLib::Quote`.
pub trait Quote: Observable + std::fmt::Debug + Send + Sync {
    /// Return the current value.
    ///
    /// Returns `None` if the quote is not currently valid / set.
    fn value(&self) -> Option<Real>;

    /// Return `true` if the quote is currently valid.
    fn is_valid(&self) -> bool {
        self.value().is_some()
    }
}

/// A simple, mutable market quote.
///
/// Setting a new value notifies every registered observer. The value sits
/// behind a lock so a quote can be shared (`Arc<SimpleQuote>`) between the
/// instruments it drives and whoever moves the market.
///
/// Corresponds to `QuantLib::SimpleQuote`.
#[derive(Debug, Default)]
pub struct SimpleQuote {
    value: Mutex<Option<Real>>,
    observable: ObservableImpl,
}

impl SimpleQuote {
    /// Create a new quote with the given value.
    pub fn new(value: Real) -> Self {
        Self {
            value: Mutex::new(Some(value)),
            observable: ObservableImpl::new(),
        }
    }

    /// Create an empty (invalid) quote.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set a new value and return the change `new - old` (`0.0` if the
    /// quote was empty).
    ///
    /// Observers are notified only if the stored value actually changes.
    pub fn set_value(&self, value: Real) -> Real {
        let previous = {
            let mut slot = self.value.lock().unwrap_or_else(PoisonError::into_inner);
            slot.replace(value)
        };
        if previous != Some(value) {
            self.observable.notify();
        }
        previous.map_or(0.0, |old| value - old)
    }

    /// Clear the value, making the quote invalid.
    pub fn reset(&self) {
        let previous = self
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            self.observable.notify();
        }
    }
}

impl Quote for SimpleQuote {
    fn value(&self) -> Option<Real> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Observable for SimpleQuote {
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
