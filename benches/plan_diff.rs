//! Planner benchmark over synthetic trees.

use criterion::{criterion_group, criterion_main, Criterion};
use driftsync::snapshot::Node;
use driftsync::{plan, PlannerConfig};
use std::collections::BTreeMap;
use std::hint::black_box;

/// Balanced tree: `breadth` subdirectories per level down to `depth`, with
/// `breadth` files in every directory.
fn synthetic_tree(parent: &str, name: &str, depth: usize, breadth: usize, stamp: i64) -> Node {
    let path = format!("{parent}/{name}");
    let mut children = BTreeMap::new();
    for i in 0..breadth {
        let file = Node::file(
            format!("file{i}.dat"),
            path.clone(),
            stamp + i as i64,
            Some(format!("{:032x}", i as u128)),
        );
        children.insert(file.name().to_owned(), file);
    }
    if depth > 0 {
        for i in 0..breadth {
            let dir = synthetic_tree(&path, &format!("dir{i}"), depth - 1, breadth, stamp);
            children.insert(dir.name().to_owned(), dir);
        }
    }
    Node::directory(name, parent, children)
}

fn bench_plan(c: &mut Criterion) {
    let config = PlannerConfig::default();
    let source = synthetic_tree("/src", "root", 3, 6, 1_600_000_000);
    let identical = synthetic_tree("/dst", "root", 3, 6, 1_600_000_000);
    // Shifted stamps with the same hashes: the planner must still report
    // no changes, exercising the hash-first comparison on every file.
    let shifted = synthetic_tree("/dst", "root", 3, 6, 1_700_000_000);

    c.bench_function("plan_identical_trees", |b| {
        b.iter(|| plan(black_box(&source), black_box(&identical), &config).unwrap())
    });
    c.bench_function("plan_hash_equal_shifted_stamps", |b| {
        b.iter(|| plan(black_box(&source), black_box(&shifted), &config).unwrap())
    });
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
