#![forbid(unsafe_code)]

//! Change-tracked value maps.
//!
//! The mutable-state layer under editable records: a [`ValueMap`] stores
//! current key/value bindings, remembers the value each dirty key had before
//! its first unsaved change, and broadcasts every effective change as a
//! [`ValueChange`].
//!
//! # Modules
//!
//! - [`value_map`]: the map itself (set/remove/revert/save/copy/set_as).
//! - [`change`]: the change event record.
//! - [`reactive`]: broadcasters, observables, and RAII subscriptions.
//! - [`hooks`]: copy and side-effect extension points.
//! - [`provider`]: bulk value sources.
//!
//! # Threading
//!
//! Everything here is `!Send`: a map and its observers live on one thread
//! (typically a UI event loop), and every operation completes before it
//! returns.

pub mod change;
pub mod hooks;
pub mod provider;
pub mod reactive;
pub mod value_map;

pub use change::ValueChange;
pub use hooks::{MapHooks, PlainHooks};
pub use provider::ValueProvider;
pub use reactive::{Broadcaster, Observable, ObservableView, Subscription};
pub use value_map::ValueMap;
