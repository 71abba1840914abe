//! Per-frame cost of the motion detection pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use motion_sentry::capture::Frame;
use motion_sentry::config::{DetectConfig, EventConfig};
use motion_sentry::detect::MotionPipeline;
use std::time::Instant;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

fn frame(offset: u8, sequence: u64) -> Frame {
    let pixels: Vec<u8> = (0..(WIDTH * HEIGHT) as usize)
        .map(|i| ((i as u64).wrapping_mul(31) as u8).wrapping_add(offset))
        .collect();
    Frame::new(pixels, WIDTH, HEIGHT, sequence)
}

fn bench_process(c: &mut Criterion) {
    let detect = DetectConfig::default();
    let events = EventConfig::default();

    c.bench_function("process_640x480", |b| {
        let mut pipeline = MotionPipeline::new(&detect, &events);
        let first = frame(0, 1);
        pipeline.process(&first, Instant::now());
        let next = frame(40, 2);

        b.iter(|| pipeline.process(black_box(&next), Instant::now()));
    });
}

criterion_group!(benches, bench_process);
criterion_main!(benches);
