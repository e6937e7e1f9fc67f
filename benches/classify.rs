//! Benchmarks for dependency-name classification.
//!
//! The classifier runs on the loader's import-resolution path, once per
//! delayed dependency, so the interesting question is how the three outcomes
//! compare and how cost scales with name length. No process state is
//! involved; this measures the pure string policy.

use criterion::{criterion_group, criterion_main, Criterion};
use hostlink::HostIdentity;
use std::hint::black_box;

fn bench_classify(c: &mut Criterion) {
    let identity = HostIdentity::new("acorn.exe", "acorn.dll", ".acorn").expect("valid identity");

    let mut group = c.benchmark_group("classify");
    group.bench_function("host_image", |b| {
        b.iter(|| identity.classify(black_box("ACORN.EXE")));
    });
    group.bench_function("extension_module", |b| {
        b.iter(|| identity.classify(black_box("tree-sitter-parser.acorn")));
    });
    group.bench_function("unrecognized", |b| {
        b.iter(|| identity.classify(black_box("api-ms-win-core-synch-l1-2-0.dll")));
    });
    group.finish();

    let long_name = format!("{}{}", "very-long-module-name-".repeat(32), ".acorn");
    let mut group = c.benchmark_group("classify_long_names");
    group.bench_function("long_extension_module", |b| {
        b.iter(|| identity.classify(black_box(long_name.as_str())));
    });
    group.finish();
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
