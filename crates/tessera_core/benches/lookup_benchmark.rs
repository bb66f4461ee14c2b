//! # Lookup Benchmark
//!
//! Name and path resolution against committed and staged data.
//!
//! Run with: `cargo bench --package tessera_core --bench lookup_benchmark`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tessera_core::{Entity, Stage, World};

/// Children per parent.
const FANOUT: usize = 256;

/// Builds `root.group{i}.item{j}` with FANOUT groups of FANOUT items.
fn build_world() -> (World, Entity) {
    let mut world = World::new();
    let root = world.new_named(Entity::ROOT, "root").unwrap();
    for i in 0..FANOUT {
        let group = world.new_named(root, &format!("group{i}")).unwrap();
        for j in 0..FANOUT {
            world.new_named(group, &format!("item{j}")).unwrap();
        }
    }
    (world, root)
}

/// Benchmark: worst-case scan for the last child of a parent.
fn bench_lookup_child(c: &mut Criterion) {
    let (world, root) = build_world();
    let view = world.view();
    let last = format!("group{}", FANOUT - 1);
    c.bench_function("lookup_child_last_of_256", |b| {
        b.iter(|| black_box(view.lookup_child(root, black_box(&last))));
    });
}

/// Benchmark: three-segment absolute path.
fn bench_lookup_path(c: &mut Criterion) {
    let (world, _) = build_world();
    let view = world.view();
    c.bench_function("lookup_full_path_depth3", |b| {
        b.iter(|| black_box(view.lookup_full_path(black_box("::root.group128.item128"))));
    });
}

/// Benchmark: path formatting back up to the root.
fn bench_path_of(c: &mut Criterion) {
    let (world, _) = build_world();
    let view = world.view();
    let leaf = view.lookup_full_path("::root.group7.item7");
    c.bench_function("full_path_depth3", |b| {
        b.iter(|| black_box(view.full_path(black_box(leaf))));
    });
}

/// Benchmark: lookups through a stage with pending renames and a fallback hit.
fn bench_staged_lookup(c: &mut Criterion) {
    let (world, root) = build_world();
    let mut stage = Stage::new(1);
    for i in 0..FANOUT / 4 {
        let group = world.view().lookup_child(root, &format!("group{i}"));
        stage.set_name(&world, group, &format!("renamed{i}")).unwrap();
    }
    let fresh = stage.new_named(&world, root, "fresh").unwrap();
    let nested = stage.new_named(&world, fresh, "nested").unwrap();

    let view = stage.view(&world);
    c.bench_function("staged_lookup_renamed", |b| {
        b.iter(|| black_box(view.lookup_child(root, black_box("renamed10"))));
    });
    c.bench_function("staged_lookup_fallback", |b| {
        b.iter(|| {
            let found = view.lookup_child(fresh, black_box("nested"));
            debug_assert_eq!(found, nested);
            black_box(found)
        });
    });
}

/// Benchmark: walk every child table of a parent.
fn bench_tree_iter(c: &mut Criterion) {
    let (world, root) = build_world();
    let group = world.view().lookup_child(root, "group0");
    c.bench_function("tree_iter_256_children", |b| {
        b.iter(|| {
            let count: usize = world.tree_iter(black_box(group)).map(|batch| batch.count()).sum();
            black_box(count)
        });
    });
}

criterion_group!(
    benches,
    bench_lookup_child,
    bench_lookup_path,
    bench_path_of,
    bench_staged_lookup,
    bench_tree_iter,
);
criterion_main!(benches);
