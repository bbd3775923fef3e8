//! LazyObject pattern (translates `ql/patterns/lazyobject.hpp`).
//!
//! A `LazyObject` caches an expensive computation and recalculates only when
//! one of its inputs has notified a change. Invalidation is push (flip a
//! flag), recalculation is pull (on the next read).
//!
//! The bookkeeping lives in [`LazyState`]: an atomic "calculated" flag that
//! notifications can flip at any time, a freeze counter, and a mutex held for
//! the duration of a recalculation so that concurrent readers serialise.

use crate::errors::Result;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

/// Trait for objects that lazily compute and cache their results.
///
/// Implementors provide [`perform_calculations`][Self::perform_calculations]
/// and access to their embedded [`LazyState`].
pub trait LazyObject {
    /// Perform the actual (expensive) calculation and store its results.
    ///
    /// Called by [`calculate`][Self::calculate] when the cache is stale.
    fn perform_calculations(&self) -> Result<()>;

    /// The embedded bookkeeping state.
    fn lazy_state(&self) -> &LazyState;

    /// Ensure results are up-to-date.
    ///
    /// The cache is marked valid only after `perform_calculations` returns
    /// `Ok`; on error it stays stale so the next call retries. Notifications
    /// received while the calculation runs (typically caused by the
    /// calculation itself) do not force a second pass.
    fn calculate(&self) -> Result<()> {
        let state = self.lazy_state();
        if state.is_calculated() || state.is_frozen() {
            return Ok(());
        }
        let _guard = state.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if state.is_calculated() {
            return Ok(());
        }
        self.perform_calculations()?;
        state.calculated.store(true, Ordering::Release);
        Ok(())
    }

    /// Mark the cached result as stale without triggering a recalculation.
    ///
    /// Returns `true` if the cache was valid before the call, i.e. this is
    /// the notification that invalidated it.
    fn invalidate(&self) -> bool {
        self.lazy_state().calculated.swap(false, Ordering::AcqRel)
    }

    /// Prevent automatic recalculation until [`unfreeze`][Self::unfreeze].
    fn freeze(&self) {
        self.lazy_state().freeze_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Undo one call to [`freeze`][Self::freeze].
    fn unfreeze(&self) {
        let _ = self.lazy_state().freeze_count.fetch_update(
            Ordering::AcqRel,
            Ordering::Acquire,
            |count| count.checked_sub(1),
        );
    }

    /// Return `true` if the cache is currently valid.
    fn is_calculated(&self) -> bool {
        self.lazy_state().is_calculated()
    }
}

/// Bookkeeping fields required by [`LazyObject`].
///
/// # Example
/// ```
/// use std::sync::Mutex;
/// use ql_core::patterns::lazy_object::{LazyObject, LazyState};
///
/// struct Squared {
///     state: LazyState,
///     input: f64,
///     result: Mutex<f64>,
/// }
///
/// impl LazyObject for Squared {
///     fn perform_calculations(&self) -> ql_core::errors::Result<()> {
///         *self.result.lock().unwrap() = self.input * self.input;
///         Ok(())
///     }
///     fn lazy_state(&self) -> &LazyState { &self.state }
/// }
///
/// let obj = Squared { state: LazyState::new(), input: 3.0, result: Mutex::new(0.0) };
/// obj.calculate().unwrap();
/// assert_eq!(*obj.result.lock().unwrap(), 9.0);
/// ```
#[derive(Debug, Default)]
pub struct LazyState {
    calculated: AtomicBool,
    freeze_count: AtomicU32,
    lock: Mutex<()>,
}

impl LazyState {
    /// Create a new `LazyState` where the cache is initially stale.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when the cached result is valid.
    pub fn is_calculated(&self) -> bool {
        self.calculated.load(Ordering::Acquire)
    }

    /// `true` if recalculation is currently deferred.
    pub fn is_frozen(&self) -> bool {
        self.freeze_count.load(Ordering::Acquire) > 0
    }
}
