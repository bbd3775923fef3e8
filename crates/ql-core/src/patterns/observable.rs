//! Observer / Observable pattern (translates `ql/patterns/observable.hpp`).
//!
//! * An **Observable** object notifies registered **Observer**s whenever it
//!   changes state.
//! * Observers react by calling `update()`.
//!
//! Observers are held through `Weak` references, so dropping the last `Arc`
//! to an observer is equivalent to unregistering it. The observer list sits
//! behind a `Mutex`, which keeps observables `Sync` and lets them be shared
//! through `Arc` the way QuantLib shares them through `shared_ptr`.

use std::sync::{Arc, Mutex, PoisonError, Weak};

/// An object that can notify interested parties when it changes.
///
/// All methods take `&self`; the observer list uses interior mutability.
pub trait Observable {
    /// Register an observer to receive future change notifications.
    fn register_observer(&self, observer: Weak<dyn Observer>);

    /// Remove a previously registered observer.
    fn unregister_observer(&self, observer: &Weak<dyn Observer>);

    /// Notify all currently registered observers that this object has changed.
    fn notify_observers(&self);
}

/// An object that reacts to changes in [`Observable`]s it has subscribed to.
pub trait Observer: Send + Sync {
    /// Called by every observable this observer is registered with when that
    /// observable changes state.
    ///
    /// Implementations may be re-entered while one of their own calculations
    /// is running and must not recalculate eagerly.
    fn update(&self);
}

/// Observer-list bookkeeping that can be embedded in any observable type.
#[derive(Default)]
pub struct ObservableImpl {
    observers: Mutex<Vec<Weak<dyn Observer>>>,
}

impl ObservableImpl {
    /// Create a new, empty observable implementation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Registering the same observer twice is a no-op.
    pub fn register(&self, observer: Weak<dyn Observer>) {
        let mut observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        if !observers.iter().any(|o| Weak::ptr_eq(o, &observer)) {
            observers.push(observer);
        }
    }

    /// Remove an observer (by pointer equality of the `Weak`).
    pub fn unregister(&self, observer: &Weak<dyn Observer>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|o| !Weak::ptr_eq(o, observer));
    }

    /// Number of registered observers that are still alive.
    pub fn observer_count(&self) -> usize {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|o| o.strong_count() > 0)
            .count()
    }

    /// Notify all live observers, removing dead `Weak` references as we go.
    ///
    /// The lock is released before any observer runs, so observers may
    /// register, unregister or trigger further notifications.
    pub fn notify(&self) {
        let live: Vec<Arc<dyn Observer>> = {
            let mut observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
            observers.retain(|o| o.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        for observer in live {
            observer.update();
        }
    }
}

impl std::fmt::Debug for ObservableImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableImpl")
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// Register `observer` with `observable`, coercing the `Arc` to a
/// `Weak<dyn Observer>`.
pub fn register_with<O>(observer: &Arc<O>, observable: &(impl Observable + ?Sized))
where
    O: Observer + 'static,
{
    let weak: Weak<O> = Arc::downgrade(observer);
    observable.register_observer(weak);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingObserver {
        count: AtomicU32,
    }

    impl CountingObserver {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                count: AtomicU32::new(0),
            })
        }
    }

    impl Observer for CountingObserver {
        fn update(&self) {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn register_and_notify() {
        let obs = CountingObserver::new();
        let observable = ObservableImpl::new();
        observable.register(Arc::downgrade(&obs) as Weak<dyn Observer>);
        observable.notify();
        assert_eq!(obs.count.load(Ordering::Relaxed), 1);
        observable.notify();
        assert_eq!(obs.count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn duplicate_registration_notifies_once() {
        let obs = CountingObserver::new();
        let observable = ObservableImpl::new();
        observable.register(Arc::downgrade(&obs) as Weak<dyn Observer>);
        observable.register(Arc::downgrade(&obs) as Weak<dyn Observer>);
        observable.notify();
        assert_eq!(obs.count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn dead_observer_pruned() {
        let observable = ObservableImpl::new();
        {
            let obs = CountingObserver::new();
            observable.register(Arc::downgrade(&obs) as Weak<dyn Observer>);
            assert_eq!(observable.observer_count(), 1);
        }
        observable.notify();
        assert_eq!(observable.observers.lock().unwrap().len(), 0);
    }

    #[test]
    fn unregister() {
        let obs = CountingObserver::new();
        let weak = Arc::downgrade(&obs) as Weak<dyn Observer>;
        let observable = ObservableImpl::new();
        observable.register(weak.clone());
        observable.unregister(&weak);
        observable.notify();
        assert_eq!(obs.count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn notification_may_reenter_observable() {
        struct Reentrant {
            target: Arc<ObservableImpl>,
            hits: AtomicU32,
        }
        impl Observer for Reentrant {
            fn update(&self) {
                // A nested registration query must not deadlock.
                let _ = self.target.observer_count();
                self.hits.fetch_add(1, Ordering::Relaxed);
            }
        }

        let observable = Arc::new(ObservableImpl::new());
        let obs = Arc::new(Reentrant {
            target: Arc::clone(&observable),
            hits: AtomicU32::new(0),
        });
        observable.register(Arc::downgrade(&obs) as Weak<dyn Observer>);
        observable.notify();
        assert_eq!(obs.hits.load(Ordering::Relaxed), 1);
    }
}
