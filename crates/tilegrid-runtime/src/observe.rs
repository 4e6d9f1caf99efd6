#![forbid(unsafe_code)]

//! Order-change observers.
//!
//! The rendering layer is a pure observer of the item order: it registers a
//! callback and re-renders from the slice it is handed. Callbacks are held
//! weakly; the returned [`Subscription`] guard owns the only strong handle,
//! so dropping it unsubscribes.
//!
//! # Failure Modes
//!
//! - **Re-entrant notify**: callbacks are collected before any is invoked,
//!   so a callback may subscribe or drop guards without a borrow panic.
//!   Callbacks registered during a notify are first called on the next one.
//! - **Dead entries**: pruned lazily on each [`OrderObservers::notify`].

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tilegrid_core::ItemId;

type CallbackRc = Rc<dyn Fn(&[ItemId])>;
type CallbackWeak = Weak<dyn Fn(&[ItemId])>;

/// RAII guard for one registered callback.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Registration-ordered set of order-change callbacks.
#[derive(Clone, Default)]
pub struct OrderObservers {
    inner: Rc<RefCell<Vec<CallbackWeak>>>,
}

impl fmt::Debug for OrderObservers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderObservers")
            .field("subscriber_count", &self.inner.borrow().len())
            .finish()
    }
}

impl OrderObservers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`; it runs on every subsequent notify until the
    /// guard is dropped.
    pub fn subscribe(&self, callback: impl Fn(&[ItemId]) + 'static) -> Subscription {
        let strong: CallbackRc = Rc::new(callback);
        self.inner.borrow_mut().push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Registered callbacks, including dead ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every live callback with `order`, in registration order.
    pub fn notify(&self, order: &[ItemId]) {
        let callbacks: Vec<CallbackRc> = {
            let mut inner = self.inner.borrow_mut();
            inner.retain(|w| w.strong_count() > 0);
            inner.iter().filter_map(Weak::upgrade).collect()
        };
        if callbacks.is_empty() {
            return;
        }
        let _span = tracing::trace_span!(
            "observers.notify",
            subscribers = callbacks.len(),
            len = order.len()
        )
        .entered();
        for cb in &callbacks {
            cb(order);
        }
    }
}
