#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use ebtree::{BytesOps, NodeId, Tree};

const LEN: usize = 4;

#[derive(Arbitrary, Debug)]
enum TreeMethod {
    Insert { key: Vec<u8> },
    Delete { key: Vec<u8> },
    Lookup { key: Vec<u8> },
    Unlink { index: usize },
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    unique: bool,
    methods: Vec<TreeMethod>,
}

fn padded(key: &[u8]) -> Vec<u8> {
    let mut key = key[..key.len().min(LEN)].to_vec();
    key.resize(LEN, 0);
    key
}

fuzz_target!(|input: FuzzInput| {
    let mut tree = if input.unique {
        Tree::<Vec<u8>, ()>::new_unique()
    } else {
        Tree::<Vec<u8>, ()>::new()
    };
    let mut model = BTreeMap::<Vec<u8>, Vec<NodeId>>::new();

    for m in input.methods {
        match m {
            TreeMethod::Insert { key } => {
                let key = padded(&key);
                let id = tree.alloc(key.clone(), ());
                let linked = tree.insert(id, LEN).unwrap();
                if linked == id {
                    model.entry(key).or_default().push(id);
                } else {
                    assert!(input.unique);
                    tree.free(id).unwrap();
                }
            }
            TreeMethod::Delete { key } => {
                let key = padded(&key);
                let found = tree.lookup(&key, LEN);
                let expected = model.get_mut(&key).map(|ids| ids.remove(0));
                assert_eq!(found, expected);
                if model.get(&key).is_some_and(|ids| ids.is_empty()) {
                    model.remove(&key);
                }
                if let Some(id) = found {
                    tree.remove(id).unwrap();
                }
            }
            TreeMethod::Lookup { key } => {
                let key = padded(&key);
                assert_eq!(tree.lookup(&key, LEN), model.get(&key).map(|ids| ids[0]));
            }
            TreeMethod::Unlink { index } => {
                // Take a node from the middle of a duplicate group as often as from its front.
                let Some((key, ids)) = model.iter_mut().nth(index % 64) else {
                    continue;
                };
                let id = ids.remove(index % ids.len());
                if ids.is_empty() {
                    let key = key.clone();
                    model.remove(&key);
                }
                tree.unlink(id).unwrap();
                tree.free(id).unwrap();
            }
        }
    }

    tree.check_invariants(LEN).unwrap();
    let got: Vec<NodeId> = tree.iter().map(|(id, _, _)| id).collect();
    let expected: Vec<NodeId> = model.values().flatten().copied().collect();
    assert_eq!(got, expected);
    let uniques: Vec<NodeId> = tree.iter_unique().map(|(id, _, _)| id).collect();
    let heads: Vec<NodeId> = model.values().map(|ids| ids[0]).collect();
    assert_eq!(uniques, heads);
});
