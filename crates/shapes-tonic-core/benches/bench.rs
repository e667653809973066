use core::hint::black_box;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use shapes_tonic_core::{
    geometry::{area, perimeter},
    proto::ShapeCoord,
    shape_id::normalize_shape_id,
};

/// A regular-ish polygon with `n` integer vertices on a circle of radius 1000.
fn polygon(n: usize) -> Vec<ShapeCoord> {
    (0..n)
        .map(|i| {
            let theta = core::f64::consts::TAU * i as f64 / n as f64;
            ShapeCoord {
                x: (1000.0 * theta.cos()) as i32,
                y: (1000.0 * theta.sin()) as i32,
            }
        })
        .collect()
}

fn bench_geometry(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometry");

    // 3-5 are the shapes the service stores; the rest show scaling.
    for n in [3, 4, 5, 64, 1024] {
        let coords = polygon(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("perimeter", n), &coords, |b, coords| {
            b.iter(|| perimeter(black_box(coords)));
        });
        group.bench_with_input(BenchmarkId::new("area", n), &coords, |b, coords| {
            b.iter(|| area(black_box(coords)));
        });
    }

    group.finish();
}

fn bench_shape_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("shape_id");
    group.throughput(Throughput::Elements(1));

    for input in ["T-3", "r-0042", "p-18446744073709551615", "not-an-id"] {
        group.bench_with_input(BenchmarkId::new("normalize", input), &input, |b, input| {
            b.iter(|| normalize_shape_id(black_box(input)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_geometry, bench_shape_id);
criterion_main!(benches);
