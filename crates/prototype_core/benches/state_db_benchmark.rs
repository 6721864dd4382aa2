//! # Object Store Benchmark
//!
//! Measures the two paths a simulation frame leans on:
//! - Create/destroy churn (swap-compaction cost)
//! - Dense iteration over packed state rows
//!
//! Run with: `cargo bench --package prototype_core`

#![allow(missing_docs)]

use bytemuck::{Pod, Zeroable};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use prototype_core::{ObjectHandle, StateDb, StateKey, TypeId};

const OBJECT_COUNT: usize = 100_000;

#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
struct Body {
    position: [f32; 3],
    velocity: [f32; 3],
    mass: f32,
    _pad: f32,
}

fn populated(count: usize) -> (StateDb, TypeId, StateKey<Body>, Vec<ObjectHandle>) {
    let mut db = StateDb::new();
    let ty = db.register_type("Body", count);
    let key = db.register_state::<Body>(ty, "Info");
    let handles = (0..count)
        .filter_map(|i| {
            let (h, body) = db.create(key).ok()?;
            body.velocity = [0.1, 0.2, i as f32 * 0.001];
            body.mass = 1.0;
            Some(h)
        })
        .collect();
    (db, ty, key, handles)
}

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_objects");
    for count in [1_000, 10_000, OBJECT_COUNT] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let (db, ty, _, _) = populated(count);
                black_box(db.object_count(ty))
            });
        });
    }
    group.finish();
}

fn bench_destroy_create_churn(c: &mut Criterion) {
    let (mut db, ty, _, mut handles) = populated(OBJECT_COUNT);

    c.bench_function("churn_10K_of_100K", |b| {
        b.iter(|| {
            for h in handles.iter_mut().step_by(10) {
                let _ = db.destroy_object(*h);
                if let Ok(fresh) = db.create_object(ty) {
                    *h = fresh;
                }
            }
            black_box(db.object_count(ty))
        });
    });
}

fn bench_dense_iteration(c: &mut Criterion) {
    let (mut db, _, key, _) = populated(OBJECT_COUNT);

    c.bench_function("integrate_100K_bodies", |b| {
        b.iter(|| {
            for body in db.full_state_mut(key) {
                for axis in 0..3 {
                    body.position[axis] += body.velocity[axis] * 0.016;
                }
            }
            black_box(db.full_state(key).len())
        });
    });
}

fn bench_handle_lookup(c: &mut Criterion) {
    let (db, _, key, handles) = populated(OBJECT_COUNT);

    c.bench_function("lookup_100K_handles", |b| {
        b.iter(|| {
            let mut mass = 0.0_f32;
            for &h in &handles {
                if let Some(body) = db.state(key, h) {
                    mass += body.mass;
                }
            }
            black_box(mass)
        });
    });
}

criterion_group!(
    benches,
    bench_create,
    bench_destroy_create_churn,
    bench_dense_iteration,
    bench_handle_lookup,
);

criterion_main!(benches);
