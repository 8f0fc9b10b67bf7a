//! # Registry Registration Benchmark
//!
//! Cascade resolution against a naive "rescan the pending list until nothing
//! changes" baseline. The baseline goes quadratic on a chain registered
//! dependents first; the registry stays linear.
//!
//! Run with: `cargo bench --package concord_core --bench registry_benchmark`

#![allow(missing_docs)]

use std::collections::HashSet;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use concord_core::Registry;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// (name, deps) pairs.
type Graph = Vec<(String, Vec<String>)>;

/// n0 <- n1 <- ... <- n(len-1), listed dependents first.
fn reversed_chain(len: usize) -> Graph {
    (0..len)
        .rev()
        .map(|i| {
            let deps = if i == 0 { Vec::new() } else { vec![format!("n{}", i - 1)] };
            (format!("n{i}"), deps)
        })
        .collect()
}

/// Random DAG, up to `fan_in` edges per node pointing at lower indices,
/// listed in shuffled order.
fn shuffled_dag(len: usize, fan_in: usize, seed: u64) -> Graph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph: Graph = (0..len)
        .map(|i| {
            let deps = if i == 0 {
                Vec::new()
            } else {
                (0..fan_in)
                    .map(|_| format!("n{}", rng.gen_range(0..i)))
                    .collect()
            };
            (format!("n{i}"), deps)
        })
        .collect();
    graph.shuffle(&mut rng);
    graph
}

fn register(graph: &Graph) -> Registry<usize> {
    let mut registry = Registry::with_capacity(graph.len());
    for (value, (name, deps)) in graph.iter().enumerate() {
        let _ = registry.add(name, deps, value);
    }
    registry
}

/// Baseline: keep every unresolved entry in a list and rescan it after each
/// successful placement.
fn register_naive(graph: &Graph) -> Vec<usize> {
    let mut placed: HashSet<&str> = HashSet::new();
    let mut order = Vec::with_capacity(graph.len());
    let mut waiting: Vec<usize> = Vec::new();

    for index in 0..graph.len() {
        waiting.push(index);
        let mut progress = true;
        while progress {
            progress = false;
            let mut i = 0;
            while i < waiting.len() {
                let (name, deps) = &graph[waiting[i]];
                if deps.iter().all(|dep| placed.contains(dep.as_str())) {
                    placed.insert(name.as_str());
                    order.push(waiting.swap_remove(i));
                    progress = true;
                } else {
                    i += 1;
                }
            }
        }
    }
    order
}

fn bench_reversed_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("reversed_chain");

    for len in [100, 1_000, 5_000] {
        let graph = reversed_chain(len);
        group.bench_with_input(BenchmarkId::new("cascade", len), &graph, |b, graph| {
            b.iter(|| black_box(register(graph).len()));
        });
        group.bench_with_input(BenchmarkId::new("rescan", len), &graph, |b, graph| {
            b.iter(|| black_box(register_naive(graph).len()));
        });
    }

    group.finish();
}

fn bench_shuffled_dag(c: &mut Criterion) {
    let mut group = c.benchmark_group("shuffled_dag");

    for len in [1_000, 10_000, 50_000] {
        let graph = shuffled_dag(len, 4, 0xC0C0);
        group.bench_with_input(BenchmarkId::from_parameter(len), &graph, |b, graph| {
            b.iter(|| black_box(register(graph).len()));
        });
    }

    group.finish();
}

fn bench_order_traversal(c: &mut Criterion) {
    let registry = register(&shuffled_dag(10_000, 4, 7));

    c.bench_function("order_10k", |b| {
        b.iter(|| black_box(registry.order().copied().sum::<usize>()));
    });
    c.bench_function("order_reverse_10k", |b| {
        b.iter(|| black_box(registry.order_reverse().copied().sum::<usize>()));
    });
}

criterion_group!(
    benches,
    bench_reversed_chain,
    bench_shuffled_dag,
    bench_order_traversal,
);

criterion_main!(benches);
