//! A shared, observable reference to a value (translates
//! `ql/handle.hpp`).
//!
//! A `Handle<T>` is a reference-counted pointer that may be empty. Handles to
//! trait objects (`Handle<dyn YieldTermStructure>`) are the usual way curves
//! and quotes are passed between components; registering with a handle
//! registers with the object it currently points to.

use crate::errors::{Error, Result};
use crate::patterns::observable::{Observable, Observer};
use std::sync::{Arc, Weak};

/// A shared, optionally-null reference to a value of type `T`.
///
/// Equivalent to QuantLib's `Handle<T>`.
pub struct Handle<T: ?Sized> {
    inner: Option<Arc<T>>,
}

impl<T> Handle<T> {
    /// Create a non-null handle wrapping `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Some(Arc::new(value)),
        }
    }
}

impl<T: ?Sized> Handle<T> {
    /// Create a handle from an existing `Arc`.
    pub fn from_arc(arc: Arc<T>) -> Self {
        Self { inner: Some(arc) }
    }

    /// Create a null (empty) handle.
    pub fn null() -> Self {
        Self { inner: None }
    }

    /// Return `true` if the handle is null (contains no value).
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// Return a reference to the inner `Arc<T>`, or `None` if this handle is
    /// null.
    pub fn as_arc(&self) -> Option<&Arc<T>> {
        self.inner.as_ref()
    }

    /// Attempt to borrow the contained value.
    pub fn get(&self) -> Option<&T> {
        self.inner.as_deref()
    }

    /// The object the handle points to, or `Error::NullValue` if empty.
    pub fn current_link(&self) -> Result<&Arc<T>> {
        self.inner.as_ref().ok_or(Error::NullValue)
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: ?Sized> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> From<Arc<T>> for Handle<T> {
    fn from(arc: Arc<T>) -> Self {
        Self::from_arc(arc)
    }
}

impl<T: ?Sized + std::fmt::Debug> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Some(v) => write!(f, "Handle({:?})", v),
            None => write!(f, "Handle(null)"),
        }
    }
}

impl<T: ?Sized + Observable> Observable for Handle<T> {
    fn register_observer(&self, observer: Weak<dyn Observer>) {
        if let Some(target) = &self.inner {
            target.register_observer(observer);
        }
    }

    fn unregister_observer(&self, observer: &Weak<dyn Observer>) {
        if let Some(target) = &self.inner {
            target.unregister_observer(observer);
        }
    }

    fn notify_observers(&self) {
        if let Some(target) = &self.inner {
            target.notify_observers();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::observable::ObservableImpl;
    use std::sync::atomic::{AtomicU32, Ordering};

    trait Named: Observable + Send + Sync {
        fn name(&self) -> &str;
    }

    struct Leaf {
        observable: ObservableImpl,
    }

    impl Named for Leaf {
        fn name(&self) -> &str {
            "leaf"
        }
    }

    impl Observable for Leaf {
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

    struct Hits(AtomicU32);

    impl Observer for Hits {
        fn update(&self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn null_handle() {
        let h: Handle<dyn Named> = Handle::null();
        assert!(h.is_empty());
        assert_eq!(h.current_link().err(), Some(Error::NullValue));
    }

    #[test]
    fn trait_object_handle_forwards_registration() {
        let leaf: Arc<dyn Named> = Arc::new(Leaf {
            observable: ObservableImpl::new(),
        });
        let h = Handle::from_arc(Arc::clone(&leaf));
        assert_eq!(h.current_link().unwrap().name(), "leaf");

        let hits = Arc::new(Hits(AtomicU32::new(0)));
        h.register_observer(Arc::downgrade(&hits) as Weak<dyn Observer>);
        leaf.notify_observers();
        assert_eq!(hits.0.load(Ordering::Relaxed), 1);
    }
}
