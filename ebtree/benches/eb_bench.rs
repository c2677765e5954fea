/// Overall simple performance bench for a static # of keys in a few scenarios. Here to quickly
/// test for regressions.
use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::seq::SliceRandom;
use rand::{Rng, rng};

use ebtree::{BytesOps, NodeId, ScalarOps, Tree};

// Variations on the number of keys to insert into the tree for benchmarks that measure retrievals
const TREE_SIZES: [u64; 3] = [1 << 12, 1 << 16, 1 << 20];

const STR_LEN: usize = 8;

fn scalar_tree(size: u64) -> (Tree<u64, u64>, Vec<NodeId>) {
    let mut tree = Tree::with_options(ebtree::TreeOptions {
        unique: false,
        capacity: size as usize,
    });
    let ids = (0..size)
        .map(|i| {
            let id = tree.alloc(i, i);
            ScalarOps::insert(&mut tree, id).unwrap()
        })
        .collect();
    (tree, ids)
}

pub fn rand_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("rand_get");
    group.throughput(Throughput::Elements(1));
    for size in TREE_SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, size| {
            let (tree, _) = scalar_tree(*size);
            let mut rng = rng();
            b.iter(|| {
                let key = rng.random_range(0..*size);
                criterion::black_box(tree.lookup(key));
            })
        });
    }
    group.finish();
}

pub fn rand_get_str(c: &mut Criterion) {
    let mut group = c.benchmark_group("rand_get_str");
    let keys = gen_keys(3, 2, 3);
    group.throughput(Throughput::Elements(1));
    group.bench_function("strings", |b| {
        let mut tree = Tree::<&str, usize>::new();
        for (i, key) in keys.iter().enumerate() {
            let id = tree.alloc(key.as_str(), i);
            BytesOps::insert(&mut tree, id, STR_LEN).unwrap();
        }
        let mut rng = rng();
        b.iter(|| {
            let key = &keys[rng.random_range(0..keys.len())];
            criterion::black_box(BytesOps::lookup(&tree, key.as_bytes(), STR_LEN));
        })
    });
    group.finish();
}

/// Unlink a random node and put it straight back, which keeps the tree at a steady size.
pub fn rand_relink(c: &mut Criterion) {
    let mut group = c.benchmark_group("rand_relink");
    group.throughput(Throughput::Elements(1));
    for size in TREE_SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, size| {
            let mut tree = Tree::<u64, ()>::new();
            let mut rng = rng();
            let ids: Vec<NodeId> = (0..*size)
                .map(|_| {
                    let id = tree.alloc(rng.random(), ());
                    ScalarOps::insert(&mut tree, id).unwrap()
                })
                .collect();
            b.iter(|| {
                let id = ids[rng.random_range(0..ids.len())];
                tree.unlink(id).unwrap();
                criterion::black_box(ScalarOps::insert(&mut tree, id).unwrap());
            })
        });
    }
    group.finish();
}

pub fn seq_insert(c: &mut Criterion) {
    c.bench_function("seq_insert", |b| {
        let mut tree = Tree::<u64, u64>::new();
        let mut key = 0u64;
        b.iter(|| {
            let id = tree.alloc(key, key);
            ScalarOps::insert(&mut tree, id).unwrap();
            key += 1;
        })
    });
}

pub fn seq_remove(c: &mut Criterion) {
    for size in TREE_SIZES {
        c.bench_with_input(BenchmarkId::new("seq_remove", size), &size, |b, size| {
            let (mut tree, ids) = scalar_tree(*size);
            b.iter_custom(|iters| {
                let mut start = Instant::now();
                let mut cumulative_time = Duration::new(0, 0);
                let mut c = 0;
                for _ in 0..iters {
                    if c == ids.len() {
                        cumulative_time += start.elapsed();
                        c = 0;
                        for id in &ids {
                            ScalarOps::insert(&mut tree, *id).unwrap();
                        }
                        start = Instant::now();
                    }
                    tree.unlink(ids[c]).unwrap();
                    c += 1;
                }
                cumulative_time += start.elapsed();
                // Leave the tree whole for the next sample.
                for id in &ids[..c] {
                    ScalarOps::insert(&mut tree, *id).unwrap();
                }
                cumulative_time
            })
        });
    }
}

pub fn full_iter(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_iter");
    for size in TREE_SIZES {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, size| {
            let (tree, _) = scalar_tree(*size);
            b.iter(|| criterion::black_box(tree.iter().count()))
        });
    }
    group.finish();
}

fn gen_keys(l1_prefix: usize, l2_prefix: usize, suffix: usize) -> Vec<String> {
    let mut keys = Vec::new();
    let chars: Vec<char> = ('a'..='z').collect();
    let mut rng = rng();
    for c1 in &chars {
        let level1_prefix = c1.to_string().repeat(l1_prefix);
        for c2 in &chars {
            let level2_prefix = c2.to_string().repeat(l2_prefix);
            let key_prefix = level1_prefix.clone() + &level2_prefix;
            for _ in 0..=u8::MAX {
                let suffix: String = (0..suffix)
                    .map(|_| chars[rng.random_range(0..chars.len())])
                    .collect();
                keys.push(key_prefix.clone() + &suffix);
            }
        }
    }

    keys.shuffle(&mut rng);
    keys
}

criterion_group!(rand_benches, rand_get, rand_get_str, rand_relink);
criterion_group!(seq_benches, seq_insert, seq_remove, full_iter);
criterion_main!(seq_benches, rand_benches);
