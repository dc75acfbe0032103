#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vmap_core::ValueMap;

#[derive(Arbitrary, Debug)]
enum MapOp {
    Set(u8, i8),
    Remove(u8),
    Revert(u8),
    Save(u8),
    RevertAll,
    SaveAll,
    Clear,
    CopyInto,
    SetAsCopy,
}

fn check_shadow(map: &ValueMap<u8, i8>) {
    let originals = map.original_keys();
    assert_eq!(map.is_modified(), !originals.is_empty());
    for key in originals {
        assert!(map.contains_key(&key), "original for unbound key {key}");
        assert_ne!(map.original_value(&key), map.get_value(&key));
    }
}

fuzz_target!(|ops: Vec<MapOp>| {
    let map: ValueMap<u8, i8> = ValueMap::new();
    let other: ValueMap<u8, i8> = ValueMap::new();
    let modified = map.modified_observer();

    for op in ops.iter().take(512) {
        match *op {
            MapOp::Set(k, v) => {
                map.set_value(k & 0x0f, v);
            }
            MapOp::Remove(k) => {
                map.remove_value(&(k & 0x0f));
            }
            MapOp::Revert(k) => {
                map.revert_value(&(k & 0x0f));
            }
            MapOp::Save(k) => {
                map.save_value(&(k & 0x0f));
            }
            MapOp::RevertAll => map.revert_all(),
            MapOp::SaveAll => map.save_all(),
            MapOp::Clear => map.clear(),
            MapOp::CopyInto => other.set_as(&map),
            MapOp::SetAsCopy => {
                let copy = map.copy();
                assert!(copy == map);
                assert_eq!(copy.content_hash(), map.content_hash());
                map.set_as(&copy);
            }
        }
        check_shadow(&map);
        assert_eq!(modified.get(), map.is_modified());
    }
});
