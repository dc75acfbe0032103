//! Property-based tests for EditModel.
//!
//! 1. The valid state always agrees with a fresh full validation.
//! 2. "Set" events fire exactly for effective writes made through the model.
//! 3. "Change" events mirror the map's own stream for their key.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use proptest::prelude::*;
use vmap_core::{ValueChange, ValueMap};
use vmap_edit::{EditModel, ValidationError, Validator};

struct NonNegative;

impl Validator<u8, i16> for NonNegative {
    fn validate_value(
        &self,
        map: &ValueMap<u8, i16>,
        key: &u8,
    ) -> Result<(), ValidationError<u8, i16>> {
        match map.get_value(key) {
            Some(v) if v < 0 => Err(ValidationError::new(*key, Some(v), "must not be negative")),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
enum Op {
    ModelSet(u8, i16),
    MapSet(u8, i16),
    Remove(u8),
    Revert(u8),
    RevertAll,
    SaveAll,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..4, -3i16..3).prop_map(|(k, v)| Op::ModelSet(k, v)),
        3 => (0u8..4, -3i16..3).prop_map(|(k, v)| Op::MapSet(k, v)),
        1 => (0u8..4).prop_map(Op::Remove),
        1 => (0u8..4).prop_map(Op::Revert),
        1 => Just(Op::RevertAll),
        1 => Just(Op::SaveAll),
    ]
}

fn apply(model: &EditModel<u8, i16, NonNegative>, op: &Op) {
    let map = model.value_map();
    match *op {
        Op::ModelSet(k, v) => {
            model.set_value(k, v);
        }
        Op::MapSet(k, v) => {
            map.set_value(k, v);
        }
        Op::Remove(k) => {
            map.remove_value(&k);
        }
        Op::Revert(k) => {
            map.revert_value(&k);
        }
        Op::RevertAll => map.revert_all(),
        Op::SaveAll => map.save_all(),
    }
}

proptest! {
    #[test]
    fn valid_state_tracks_full_validation(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let map = ValueMap::new();
        let model = EditModel::new(&map, NonNegative);
        let observed = model.valid_observer();
        for op in &ops {
            apply(&model, op);
            prop_assert_eq!(model.is_valid(), model.validate().is_ok());
            prop_assert_eq!(observed.get(), model.is_valid());
        }
    }
}

proptest! {
    #[test]
    fn set_events_match_effective_model_writes(
        ops in proptest::collection::vec(op_strategy(), 0..40),
    ) {
        let map = ValueMap::new();
        let model = EditModel::new(&map, NonNegative);
        let hits = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&hits);
        let _sub = model.subscribe_value_set(0, move |_| counter.set(counter.get() + 1));

        let mut expected = 0usize;
        for op in &ops {
            if let Op::ModelSet(0, v) = *op
                && map.get_value(&0) != Some(v)
            {
                expected += 1;
            }
            apply(&model, op);
        }
        prop_assert_eq!(hits.get(), expected);
    }
}

proptest! {
    #[test]
    fn change_channel_mirrors_map_stream(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let map = ValueMap::new();
        let model = EditModel::new(&map, NonNegative);

        let from_map: Rc<RefCell<Vec<ValueChange<u8, i16>>>> = Rc::default();
        let map_sink = Rc::clone(&from_map);
        let _map_sub = map.subscribe(move |c| {
            if *c.key() == 1 {
                map_sink.borrow_mut().push(c.clone());
            }
        });
        let from_model: Rc<RefCell<Vec<ValueChange<u8, i16>>>> = Rc::default();
        let model_sink = Rc::clone(&from_model);
        let _model_sub =
            model.subscribe_value_change(1, move |c| model_sink.borrow_mut().push(c.clone()));

        for op in &ops {
            apply(&model, op);
        }
        prop_assert_eq!(&*from_model.borrow(), &*from_map.borrow());
    }
}
