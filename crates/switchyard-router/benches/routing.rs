//! Routing benchmarks.
//!
//! Run with: `cargo bench -p switchyard-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use switchyard_router::RouteTable;

fn build_table(num_routes: usize) -> RouteTable<usize> {
    let mut table = RouteTable::new();

    for i in 0..num_routes / 3 {
        table
            .insert(&format!("/api/v1/resource{i}"), "GET", i)
            .expect("static route");
    }

    for i in 0..num_routes / 3 {
        table
            .insert(&format!("/api/v1/resource{i}/<id:isDigits>"), "GET", i)
            .expect("param route");
    }

    for i in 0..num_routes / 3 {
        table
            .insert(&format!("/api/v1/org/<org:isSlug>/resource{i}/<id>"), "GET PUT", i)
            .expect("nested route");
    }

    table
}

fn resolve(table: &RouteTable<usize>, path: &str) {
    let mut candidates = Vec::with_capacity(8);
    let mut segments = Vec::with_capacity(8);
    black_box(table.resolve(&Method::GET, path, &mut candidates, &mut segments));
}

fn bench_static_match(c: &mut Criterion) {
    let table = build_table(99);

    c.bench_function("static_match", |b| {
        b.iter(|| resolve(&table, black_box("/api/v1/resource20")));
    });
}

fn bench_param_match(c: &mut Criterion) {
    let table = build_table(99);

    c.bench_function("param_match", |b| {
        b.iter(|| resolve(&table, black_box("/api/v1/resource25/12345")));
    });
}

fn bench_nested_param_match(c: &mut Criterion) {
    let table = build_table(99);

    c.bench_function("nested_param_match", |b| {
        b.iter(|| resolve(&table, black_box("/api/v1/org/acme-corp/resource10/12345")));
    });
}

fn bench_regex_match(c: &mut Criterion) {
    let mut table = RouteTable::new();
    table
        .insert("/report/<day:[0-9]{4}-(0[1-9]|1[0-2])-[0-9]{2}>", "GET", 0)
        .expect("regex route");

    c.bench_function("regex_match", |b| {
        b.iter(|| resolve(&table, black_box("/report/2024-06-30")));
    });
}

fn bench_miss(c: &mut Criterion) {
    let table = build_table(99);

    c.bench_function("miss", |b| {
        b.iter(|| resolve(&table, black_box("/api/v1/nonexistent/path")));
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for num_routes in [12, 48, 96, 480, 960] {
        let table = build_table(num_routes);

        group.bench_with_input(
            BenchmarkId::new("static_match", num_routes),
            &num_routes,
            |b, &n| {
                let path = format!("/api/v1/resource{}", n / 6);
                b.iter(|| resolve(&table, &path));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("param_match", num_routes),
            &num_routes,
            |b, &n| {
                let path = format!("/api/v1/resource{}/12345", n / 6);
                b.iter(|| resolve(&table, &path));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_static_match,
    bench_param_match,
    bench_nested_param_match,
    bench_regex_match,
    bench_miss,
    bench_scaling
);
criterion_main!(benches);
