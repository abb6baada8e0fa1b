use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::{Duration, Instant};

use clipwatch::watch::{DoubleSubmitDetector, DoubleSubmitOptions};

fn bench_observe(c: &mut Criterion) {
    let start = Instant::now();

    c.bench_function("observe_confirming_pair", |b| {
        b.iter(|| {
            let mut detector = DoubleSubmitDetector::new(DoubleSubmitOptions::default());
            detector.observe(black_box("1701322102".to_string()), start);
            black_box(detector.observe("1701322102".to_string(), start + Duration::from_millis(300)))
        })
    });

    c.bench_function("idle_ticks_until_backoff", |b| {
        b.iter(|| {
            let mut detector = DoubleSubmitDetector::new(DoubleSubmitOptions::default());
            for _ in 0..150 {
                detector.idle();
            }
            black_box(detector.interval())
        })
    });
}

criterion_group!(benches, bench_observe);
criterion_main!(benches);
