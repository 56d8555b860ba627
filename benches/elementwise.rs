use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fastarith::op::Add;
use fastarith::{CappedCapabilities, Kernel, Width};
use std::time::Duration;

fn configure_group_for_len(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    len: usize,
) {
    if len >= 1 << 18 {
        group.sample_size(20);
        group.warm_up_time(Duration::from_millis(300));
        group.measurement_time(Duration::from_millis(900));
    } else if len >= 1 << 14 {
        group.sample_size(30);
        group.warm_up_time(Duration::from_millis(250));
        group.measurement_time(Duration::from_millis(700));
    } else {
        group.sample_size(40);
        group.warm_up_time(Duration::from_millis(200));
        group.measurement_time(Duration::from_millis(500));
    }
}

fn scalar_add(x: &[f32], y: &[f32], d: &mut [f32]) {
    for ((d, &a), &b) in d.iter_mut().zip(x).zip(y) {
        *d = a + b;
    }
}

fn elementwise_benches(c: &mut Criterion) {
    // Powers of two, plus both sides of the streaming threshold
    // (65536 elements = 256 KiB).
    let mut sizes: Vec<usize> = (0..=16).map(|p| 1usize << p).collect();
    sizes.extend([65_535, 65_537, 1 << 20]);

    let mut group = c.benchmark_group("add");

    for len in sizes {
        let x: Vec<f32> = (0..len).map(|i| ((i % 251) as f32) * 0.5 - 60.0).collect();
        let y: Vec<f32> = (0..len).map(|i| ((i % 127) as f32) * 0.25 - 15.0).collect();
        let mut d = vec![0.0f32; len];

        configure_group_for_len(&mut group, len);
        group.throughput(Throughput::Bytes((len * 3 * 4) as u64));

        group.bench_with_input(BenchmarkId::new("scalar", len), &len, |b, _| {
            b.iter(|| {
                scalar_add(black_box(&x), black_box(&y), black_box(&mut d));
            });
        });

        for width in [Width::W128, Width::W256, Width::W512] {
            let kernel = Kernel::new().with_capabilities(CappedCapabilities::new(width));
            if kernel.width() != width {
                continue;
            }
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", width), len),
                &len,
                |b, _| {
                    b.iter(|| {
                        kernel
                            .apply::<Add>(black_box(&x), black_box(&y), black_box(&mut d))
                            .unwrap();
                    });
                },
            );
        }

        group.bench_with_input(BenchmarkId::new("in_place", len), &len, |b, _| {
            let mut acc = x.clone();
            let kernel = Kernel::new();
            b.iter(|| {
                kernel
                    .apply_in_place::<Add>(black_box(&mut acc), black_box(&y))
                    .unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, elementwise_benches);
criterion_main!(benches);
