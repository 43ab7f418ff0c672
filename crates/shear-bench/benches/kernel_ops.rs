//! Criterion micro-benchmarks for the elastic rate kernels.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use shear_bench::{brick_profile, prepared_domain};
use shear_core::{GlueKind, Role};
use shear_domain::Domain;
use shear_engine::{RATE_PREFIX, STATE_PREFIX};
use shear_protocol::RateAccumulation;

fn indices_with_role(domain: &Domain, role: Role) -> Vec<usize> {
    domain
        .subdomains()
        .iter()
        .enumerate()
        .filter(|(_, s)| s.role() == Ok(role))
        .map(|(i, _)| i)
        .collect()
}

/// Benchmark: volume terms of a 64-element block, across orders on both
/// sides of the specialization cutoff.
fn bench_intra_by_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("intra_rhs_64_elements");
    for order in [2usize, 4, 6, 8, 10] {
        let (mut domain, rates) = prepared_domain(&brick_profile(order, 3, 1)).unwrap();
        let volume = indices_with_role(&domain, Role::Volume)[0];
        group.bench_with_input(BenchmarkId::from_parameter(order), &order, |b, _| {
            b.iter(|| {
                let sub = &mut domain.subdomains_mut()[volume];
                rates.scale_rates(sub, RATE_PREFIX, 0.0).unwrap();
                rates
                    .intra_rhs(sub, RATE_PREFIX, STATE_PREFIX, 0.0)
                    .unwrap();
                black_box(sub.field("_lsrk_rate_v3").unwrap()[0]);
            });
        });
    }
    group.finish();
}

/// Benchmark: boundary fluxes of the whole mesh edge at order 5.
fn bench_boundary(c: &mut Criterion) {
    let (mut domain, rates) = prepared_domain(&brick_profile(5, 3, 1)).unwrap();
    let boundary = indices_with_role(&domain, Role::Glue(GlueKind::Boundary));
    c.bench_function("inter_rhs_boundary_order5", |b| {
        b.iter(|| {
            for &i in &boundary {
                rates
                    .inter_rhs(&mut domain, i, RATE_PREFIX, STATE_PREFIX, 0.0)
                    .unwrap();
            }
        });
    });
}

/// Benchmark: trace fill plus coupling flux of local glue between four
/// subdomains.
fn bench_local_glue(c: &mut Criterion) {
    let (mut domain, rates) = prepared_domain(&brick_profile(5, 3, 4)).unwrap();
    let local = indices_with_role(&domain, Role::Glue(GlueKind::Local));
    let fields: Vec<&str> = rates.trace_fields().to_vec();
    c.bench_function("local_glue_order5", |b| {
        b.iter(|| {
            for &i in &local {
                rates
                    .fill_minus_traces(&mut domain, i, STATE_PREFIX, &fields)
                    .unwrap();
            }
            for &i in &local {
                rates
                    .inter_rhs(&mut domain, i, RATE_PREFIX, STATE_PREFIX, 0.0)
                    .unwrap();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_intra_by_order,
    bench_boundary,
    bench_local_glue
);
criterion_main!(benches);
