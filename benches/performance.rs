// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for the step sequencer
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Step toggling against patterns of increasing density
//! - Read model generation (one renderer frame)
//! - Bar paste throughput
//! - Controller message matching

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use stepgrid::control::midi_map::{status, step_pad_note, PAD_CHANNEL};
use stepgrid::control::GridController;
use stepgrid::sequencer::{
    Direction, Intent, MemoryClip, StepEvent, StepSequencerEngine,
};
use stepgrid::timing::beats_to_ticks;

/// Engine bound to an 8 bar clip with `density` events per pitch spread
/// over 16 pitches
fn dense_engine(density: u64) -> StepSequencerEngine {
    let spacing = (8 * 384 / density.max(1)).max(1);
    let events = (0..16u8).flat_map(move |p| {
        (0..density).map(move |i| StepEvent::new(36 + p, i * spacing, 12, 100))
    });
    let mut engine = StepSequencerEngine::default();
    engine.bind_clip(Box::new(MemoryClip::with_events("Bench", 8, events)));
    engine
}

fn bench_toggle(c: &mut Criterion) {
    let mut group = c.benchmark_group("toggle_step");

    for density in [16u64, 128, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(density), &density, |b, &density| {
            let mut engine = dense_engine(density);
            let mut index = 0;
            b.iter(|| {
                index = (index + 7) % 32;
                black_box(engine.dispatch(Intent::ToggleStep { pitch: None, index })).ok()
            })
        });
    }

    group.finish();
}

fn bench_read_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_model");

    for density in [0u64, 128, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(density), &density, |b, &density| {
            let mut engine = dense_engine(density);
            engine.on_transport_tick(3.3);
            b.iter(|| black_box(engine.read_model()))
        });
    }

    group.finish();
}

fn bench_paste(c: &mut Criterion) {
    c.bench_function("paste_bar", |b| {
        let mut engine = dense_engine(256);
        engine.dispatch(Intent::BeginCopy(0)).ok();
        let mut bar = 1;
        b.iter(|| {
            bar = bar % 7 + 1;
            black_box(engine.dispatch(Intent::Paste(bar))).ok()
        })
    });
}

fn bench_transport_follow(c: &mut Criterion) {
    c.bench_function("transport_tick", |b| {
        let mut engine = dense_engine(128);
        engine.dispatch(Intent::CyclePage(Direction::Next)).ok();
        let mut position = 0.0f64;
        b.iter(|| {
            position = (position + 0.01) % 32.0;
            black_box(engine.on_transport_tick(black_box(position)))
        })
    });

    c.bench_function("beats_to_ticks", |b| {
        b.iter(|| black_box(beats_to_ticks(black_box(13.3333))))
    });
}

fn bench_controller(c: &mut Criterion) {
    let mut controller = GridController::default();
    let notes: Vec<u8> = (0..32).map(step_pad_note).chain([86, 93, 112, 117]).collect();

    c.bench_function("process_midi", |b| {
        b.iter(|| {
            for &note in &notes {
                black_box(controller.process_midi(PAD_CHANNEL, status::NOTE_ON, note, 127));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_toggle,
    bench_read_model,
    bench_paste,
    bench_transport_follow,
    bench_controller,
);

criterion_main!(benches);
