#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vmap_core::ValueMap;
use vmap_edit::{EditModel, ValidationError, Validator};

struct NonNegative;

impl Validator<u8, i8> for NonNegative {
    fn validate_value(
        &self,
        map: &ValueMap<u8, i8>,
        key: &u8,
    ) -> Result<(), ValidationError<u8, i8>> {
        match map.get_value(key) {
            Some(v) if v < 0 => Err(ValidationError::new(*key, Some(v), "negative")),
            _ => Ok(()),
        }
    }
}

#[derive(Arbitrary, Debug)]
enum EditOp {
    ModelSet(u8, i8),
    MapSet(u8, i8),
    Remove(u8),
    RevertAll,
    SaveAll,
}

fuzz_target!(|ops: Vec<EditOp>| {
    let map: ValueMap<u8, i8> = ValueMap::new();
    let model = EditModel::new(&map, NonNegative);

    for op in ops.iter().take(512) {
        match *op {
            EditOp::ModelSet(k, v) => {
                model.set_value(k & 0x07, v);
            }
            EditOp::MapSet(k, v) => {
                map.set_value(k & 0x07, v);
            }
            EditOp::Remove(k) => {
                map.remove_value(&(k & 0x07));
            }
            EditOp::RevertAll => map.revert_all(),
            EditOp::SaveAll => map.save_all(),
        }
        assert_eq!(model.is_valid(), model.validate().is_ok());
    }
});
