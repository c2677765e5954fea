#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use ebtree::{NodeId, ScalarOps, Tree};

#[derive(Arbitrary, Debug)]
enum TreeMethod {
    Insert { key: u32, val: u32 },
    Delete { key: u32 },
    Lookup { key: u32 },
    LookupGe { key: u32 },
    LookupLe { key: u32 },
    Range { start: u32, end: u32 },
    Update { key: u32, val: u32 },
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    unique: bool,
    methods: Vec<TreeMethod>,
}

fuzz_target!(|input: FuzzInput| {
    let mut tree = if input.unique {
        Tree::<u32, u32>::new_unique()
    } else {
        Tree::<u32, u32>::new()
    };
    // Keys are folded into a small space so that duplicates and deletes actually hit.
    let fold = |k: u32| k % 512;
    let mut model = BTreeMap::<u32, Vec<NodeId>>::new();

    for m in input.methods {
        match m {
            TreeMethod::Insert { key, val } => {
                let key = fold(key);
                let id = tree.alloc(key, val);
                let linked = tree.insert(id).unwrap();
                if linked == id {
                    model.entry(key).or_default().push(id);
                } else {
                    assert!(input.unique);
                    assert_eq!(Some(linked), model.get(&key).map(|ids| ids[0]));
                    tree.free(id).unwrap();
                }
            }
            TreeMethod::Delete { key } => {
                let key = fold(key);
                let found = tree.lookup(key);
                let expected = model.get_mut(&key).map(|ids| ids.remove(0));
                assert_eq!(found, expected);
                if model.get(&key).is_some_and(|ids| ids.is_empty()) {
                    model.remove(&key);
                }
                if let Some(id) = found {
                    let (k, _) = tree.remove(id).unwrap();
                    assert_eq!(k, key);
                }
            }
            TreeMethod::Lookup { key } => {
                let key = fold(key);
                assert_eq!(tree.lookup(key), model.get(&key).map(|ids| ids[0]));
            }
            TreeMethod::LookupGe { key } => {
                let expected = model.range(key..).next().map(|(_, ids)| ids[0]);
                assert_eq!(tree.lookup_ge(key), expected);
            }
            TreeMethod::LookupLe { key } => {
                let expected = model
                    .range(..=key)
                    .next_back()
                    .and_then(|(_, ids)| ids.last().copied());
                assert_eq!(tree.lookup_le(key), expected);
            }
            TreeMethod::Range { start, end } => {
                let got: Vec<NodeId> = tree.range(start..=end).map(|(id, _, _)| id).collect();
                let expected: Vec<NodeId> = if start <= end {
                    model.range(start..=end).flat_map(|(_, ids)| ids.iter().copied()).collect()
                } else {
                    vec![]
                };
                assert_eq!(got, expected);
            }
            TreeMethod::Update { key, val } => {
                let key = fold(key);
                if let Some(id) = tree.lookup(key) {
                    *tree.value_mut(id).unwrap() = val;
                    assert_eq!(tree.value(id), Some(&val));
                }
            }
        }
    }

    tree.check_invariants().unwrap();
    let got: Vec<NodeId> = tree.iter().map(|(id, _, _)| id).collect();
    let expected: Vec<NodeId> = model.values().flatten().copied().collect();
    assert_eq!(got, expected);
});
