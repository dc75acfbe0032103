#![forbid(unsafe_code)]

//! Reactive change notification for value maps.
//!
//! This module provides the notification primitives the value map and the
//! edit model are built on:
//!
//! - [`Broadcaster`]: A shared fan-out point for events of one type.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`Observable`]: A shared, version-tracked value that notifies its
//!   subscribers when it changes.
//! - [`ObservableView`]: A read-only view of an `Observable`, handed out for
//!   state that only its owner may drive.
//!
//! # Architecture
//!
//! Both `Broadcaster<E>` and `Observable<T>` use `Rc<RefCell<..>>` for
//! single-threaded shared ownership. Subscribers are stored as `Weak`
//! function pointers and cleaned up lazily during notification.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. The subscriber list is snapshotted before dispatch, so a callback may
//!    subscribe, unsubscribe itself, or re-enter the emitter.
//! 3. Setting an `Observable` to a value equal to the current value is a
//!    no-op (no version bump, no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.

pub mod broadcast;
pub mod observable;

pub use broadcast::{Broadcaster, Subscription};
pub use observable::{Observable, ObservableView};
