#![forbid(unsafe_code)]

//! Event fan-out with RAII subscriptions.
//!
//! # Design
//!
//! [`Broadcaster<E>`] keeps a list of `Weak` callbacks. The strong reference
//! lives in the [`Subscription`] returned by [`subscribe`](Broadcaster::subscribe),
//! so dropping the subscription is all it takes to stop receiving events.
//!
//! # Invariants
//!
//! 1. Callbacks run in registration order.
//! 2. [`notify`](Broadcaster::notify) snapshots the live callbacks before
//!    invoking any of them and holds no borrow while they run. A callback
//!    subscribed during dispatch is first notified on the next event; a
//!    callback whose subscription is dropped during dispatch still completes
//!    the current cycle.
//! 3. Dead entries are pruned on every notification.
//!
//! # Failure Modes
//!
//! - **Callback panics**: propagates to the caller of `notify`. Callbacks
//!   later in the snapshot are not invoked for that event.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<E> = dyn Fn(&E);
type Subscribers<E> = RefCell<Vec<Weak<Callback<E>>>>;

/// A shared fan-out point for events of type `E`.
///
/// Cloning a `Broadcaster` creates a new handle to the **same** subscriber
/// list.
pub struct Broadcaster<E> {
    subscribers: Rc<Subscribers<E>>,
}

impl<E> Clone for Broadcaster<E> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Rc::clone(&self.subscribers),
        }
    }
}

impl<E> Default for Broadcaster<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Broadcaster<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<E> Broadcaster<E> {
    /// Create a broadcaster with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Number of subscriptions that are still alive.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Whether both handles point at the same subscriber list.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.subscribers, &other.subscribers)
    }

    /// Deliver `event` to every live subscriber.
    pub fn notify(&self, event: &E) {
        let live: Vec<Rc<Callback<E>>> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for callback in live {
            callback(event);
        }
    }
}

impl<E: 'static> Broadcaster<E> {
    /// Register `callback` and return the guard that keeps it registered.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let callback: Rc<Callback<E>> = Rc::new(callback);
        self.subscribers.borrow_mut().push(Rc::downgrade(&callback));
        let owner: Weak<dyn Any> = Rc::downgrade(&self.subscribers) as Weak<dyn Any>;
        Subscription {
            _callback: Box::new(callback),
            owner,
        }
    }
}

/// RAII guard for a registered callback.
///
/// Dropping the subscription unregisters the callback.
#[must_use = "dropping a Subscription unregisters its callback immediately"]
pub struct Subscription {
    _callback: Box<dyn Any>,
    owner: Weak<dyn Any>,
}

impl Subscription {
    /// Whether the broadcaster this subscription belongs to still exists.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn notifies_in_registration_order() {
        let broadcaster = Broadcaster::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&log);
        let _a = broadcaster.subscribe(move |v| first.borrow_mut().push(("a", *v)));
        let second = Rc::clone(&log);
        let _b = broadcaster.subscribe(move |v| second.borrow_mut().push(("b", *v)));

        broadcaster.notify(&7);
        assert_eq!(*log.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let broadcaster = Broadcaster::<u32>::new();
        let hits = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&hits);
        let sub = broadcaster.subscribe(move |_| counter.set(counter.get() + 1));

        broadcaster.notify(&1);
        drop(sub);
        broadcaster.notify(&2);

        assert_eq!(hits.get(), 1);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn clones_share_subscribers() {
        let a = Broadcaster::<u8>::new();
        let b = a.clone();
        let hits = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&hits);
        let _sub = a.subscribe(move |_| counter.set(counter.get() + 1));

        b.notify(&0);
        assert_eq!(hits.get(), 1);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn callback_can_drop_its_own_subscription_mid_dispatch() {
        let broadcaster = Broadcaster::<u32>::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0u32));

        let slot_inner = Rc::clone(&slot);
        let counter = Rc::clone(&hits);
        let sub = broadcaster.subscribe(move |_| {
            counter.set(counter.get() + 1);
            slot_inner.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        broadcaster.notify(&1);
        broadcaster.notify(&2);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn subscribe_during_dispatch_waits_for_next_event() {
        let broadcaster = Broadcaster::<u32>::new();
        let late: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));
        let late_hits = Rc::new(Cell::new(0u32));

        let b = broadcaster.clone();
        let late_inner = Rc::clone(&late);
        let counter = Rc::clone(&late_hits);
        let _sub = broadcaster.subscribe(move |_| {
            if late_inner.borrow().is_empty() {
                let counter = Rc::clone(&counter);
                let sub = b.subscribe(move |_| counter.set(counter.get() + 1));
                late_inner.borrow_mut().push(sub);
            }
        });

        broadcaster.notify(&1);
        assert_eq!(late_hits.get(), 0);
        broadcaster.notify(&2);
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn subscription_reports_owner_liveness() {
        let broadcaster = Broadcaster::<u32>::new();
        let sub = broadcaster.subscribe(|_| {});
        assert!(sub.is_active());
        drop(broadcaster);
        assert!(!sub.is_active());
    }
}
