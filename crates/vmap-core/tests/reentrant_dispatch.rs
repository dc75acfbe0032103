//! Re-entrant dispatch and logging behavior of ValueMap.
//!
//! Subscribers run synchronously after the map state is updated, so they may
//! read the map, write back into it, or drop their own subscription while
//! being notified.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use vmap_core::{Subscription, ValueChange, ValueMap};

#[test]
fn listener_writes_other_key_during_dispatch() {
    let map: ValueMap<&'static str, String> = ValueMap::new();
    map.set_value("first", "ann".into());
    map.set_value("full", "ann".into());

    let writer = map.clone();
    let _sub = map.subscribe(move |change| {
        if *change.key() == "first"
            && let Some(first) = change.value()
        {
            writer.set_value("full", first.to_uppercase());
        }
    });

    map.set_value("first", "bob".into());
    assert_eq!(map.get_value(&"full").as_deref(), Some("BOB"));
    assert_eq!(map.original_value(&"full").as_deref(), Some("ann"));
    assert_eq!(map.original_value(&"first").as_deref(), Some("ann"));
}

#[test]
fn listener_reverting_same_key_settles() {
    let map: ValueMap<&'static str, i32> = ValueMap::new();
    map.set_value("qty", 1);

    // Reject negatives by reverting them as soon as they are written.
    let guard = map.clone();
    let _sub = map.subscribe(move |change| {
        if change.value().is_some_and(|v| *v < 0) {
            guard.revert_value(change.key());
        }
    });

    map.set_value("qty", -5);
    assert_eq!(map.get_value(&"qty"), Some(1));
    assert!(!map.is_modified());
}

#[test]
fn listener_unsubscribes_itself() {
    let map: ValueMap<u8, u8> = ValueMap::new();
    let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let hits = Rc::new(Cell::new(0u32));

    let slot_inner = Rc::clone(&slot);
    let counter = Rc::clone(&hits);
    let once = map.subscribe(move |_| {
        counter.set(counter.get() + 1);
        slot_inner.borrow_mut().take();
    });
    *slot.borrow_mut() = Some(once);

    let others = Rc::new(Cell::new(0u32));
    let other_counter = Rc::clone(&others);
    let _other = map.subscribe(move |_| other_counter.set(other_counter.get() + 1));

    map.set_value(1, 1);
    map.set_value(1, 2);
    assert_eq!(hits.get(), 1);
    assert_eq!(others.get(), 2);
}

#[test]
fn modified_observer_sees_reentrant_revert() {
    let map: ValueMap<u8, i32> = ValueMap::new();
    map.set_value(0, 10);
    let modified = map.modified_observer();

    let guard = map.clone();
    let _sub = map.subscribe(move |change: &ValueChange<u8, i32>| {
        if change.value() == Some(&99) {
            guard.revert_value(change.key());
        }
    });

    map.set_value(0, 99);
    assert!(!map.is_modified());
    assert!(!modified.get());
}

#[test]
fn modified_observer_is_current_during_dispatch() {
    let map: ValueMap<u8, i32> = ValueMap::new();
    map.set_value(0, 1);
    let modified = map.modified_observer();

    let seen: Rc<RefCell<Vec<bool>>> = Rc::default();
    let sink = Rc::clone(&seen);
    let view = modified.clone();
    let _sub = map.subscribe(move |_| sink.borrow_mut().push(view.get()));

    map.set_value(0, 2);
    map.set_value(0, 1);
    map.remove_value(&0);
    assert_eq!(*seen.borrow(), vec![true, false, false]);
}

#[test]
fn modified_observer_is_current_during_set_as_dispatch() {
    let source: ValueMap<u8, i32> = ValueMap::new();
    source.set_value(0, 1);
    source.set_value(0, 2);
    let target: ValueMap<u8, i32> = ValueMap::new();
    let modified = target.modified_observer();

    let seen: Rc<RefCell<Vec<bool>>> = Rc::default();
    let sink = Rc::clone(&seen);
    let view = modified.clone();
    let _sub = target.subscribe(move |_| sink.borrow_mut().push(view.get()));

    target.set_as(&source);
    assert_eq!(*seen.borrow(), vec![true]);
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Captured {
    messages: Vec<String>,
}

struct Capture {
    state: Arc<Mutex<Captured>>,
}

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        struct Msg {
            message: Option<String>,
        }
        impl tracing::field::Visit for Msg {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.message = Some(value.to_string());
                }
            }

            fn record_debug(
                &mut self,
                field: &tracing::field::Field,
                value: &dyn std::fmt::Debug,
            ) {
                if field.name() == "message" {
                    self.message = Some(format!("{value:?}").trim_matches('"').to_string());
                }
            }
        }
        let mut msg = Msg { message: None };
        event.record(&mut msg);
        if let Some(message) = msg.message {
            self.state.lock().expect("capture lock").messages.push(message);
        }
    }
}

#[test]
fn bulk_operations_emit_trace_events() {
    let state = Arc::new(Mutex::new(Captured::default()));
    let subscriber = tracing_subscriber::registry().with(Capture {
        state: Arc::clone(&state),
    });
    let _guard = tracing::subscriber::set_default(subscriber);

    let map: ValueMap<u8, u8> = ValueMap::new();
    map.set_value(1, 1);
    map.set_value(1, 2);
    let copy = map.copy();
    copy.revert_all();

    let captured = state.lock().expect("capture lock");
    assert!(
        captured.messages.iter().any(|m| m == "value_map.set_as"),
        "expected value_map.set_as event"
    );
    assert!(
        captured.messages.iter().any(|m| m == "value_map.revert_all"),
        "expected value_map.revert_all event"
    );
}
