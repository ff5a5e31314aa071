//! Performance benchmarks for the per-frame overlay path

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use live_emoji_detection::{
    emotion::{EmotionReading, EmotionResult},
    face_detection::to_grayscale,
    fps::FrameClock,
    overlay::{emoji_for, intensity_percent, Overlay},
    utils::image_conversion::{gray_face_to_tensor, to_probabilities},
};
use opencv::{
    core::{Mat, Rect, Scalar, CV_8UC1, CV_8UC3},
    prelude::*,
};
use std::time::{Duration, Instant};

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    let emotion = EmotionResult::from_reading(EmotionReading::new("happy", 0.82));

    for face_count in [0usize, 1, 4] {
        let faces: Vec<Rect> = (0..face_count)
            .map(|i| Rect::new(20 + 120 * i as i32, 100, 100, 100))
            .collect();
        group.bench_with_input(BenchmarkId::new("faces", face_count), &faces, |b, faces| {
            b.iter(|| black_box(Overlay::compose(black_box(faces), &emotion, 30.0)));
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let emotion = EmotionResult::from_reading(EmotionReading::new("surprise", 0.64));
    let overlay = Overlay::compose(&[Rect::new(200, 120, 160, 160)], &emotion, 30.0);
    let frame = Mat::new_rows_cols_with_default(480, 640, CV_8UC3, Scalar::all(0.0)).unwrap();

    c.bench_function("render_640x480", |b| {
        b.iter(|| {
            let mut target = frame.try_clone().unwrap();
            overlay.render(&mut target).unwrap();
            black_box(target)
        });
    });
}

fn bench_preprocessing(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocessing");
    group.measurement_time(Duration::from_secs(5));

    let frame = Mat::new_rows_cols_with_default(480, 640, CV_8UC3, Scalar::all(128.0)).unwrap();
    group.bench_function("to_grayscale", |b| {
        b.iter(|| black_box(to_grayscale(black_box(&frame)).unwrap()));
    });

    let face = Mat::new_rows_cols_with_default(64, 64, CV_8UC1, Scalar::all(90.0)).unwrap();
    group.bench_function("gray_face_to_tensor", |b| {
        b.iter(|| black_box(gray_face_to_tensor(black_box(&face), 64).unwrap()));
    });

    let logits = [1.2f32, -0.3, 0.1, 3.4, 0.0, 0.7, 1.9];
    group.bench_function("to_probabilities", |b| {
        b.iter(|| black_box(to_probabilities(black_box(&logits))));
    });

    group.finish();
}

fn bench_lookups(c: &mut Criterion) {
    let labels = ["angry", "disgust", "fear", "happy", "sad", "surprise", "neutral", "contempt"];
    c.bench_function("emoji_for", |b| {
        b.iter(|| {
            for label in &labels {
                black_box(emoji_for(black_box(label)));
            }
        });
    });

    c.bench_function("intensity_percent", |b| {
        b.iter(|| {
            for step in 0..=100 {
                black_box(intensity_percent(black_box(step as f32 / 100.0)));
            }
        });
    });

    c.bench_function("frame_clock_tick", |b| {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let mut now = start;
        b.iter(|| {
            now += Duration::from_millis(33);
            black_box(clock.tick_at(now))
        });
    });
}

criterion_group!(benches, bench_compose, bench_render, bench_preprocessing, bench_lookups);
criterion_main!(benches);
