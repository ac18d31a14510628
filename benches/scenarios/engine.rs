//! Benchmarks for the assembled signal graph.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use waveframe::{AudioEngine, EngineConfig, SourceConfig};

use crate::BLOCK_SIZES;

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === DEFAULT PATCH ===
        // sawtooth → low-pass → gain → analyser
        let saw = EngineConfig::default().start_suspended(false);
        let engine = AudioEngine::offline(saw).expect("offline engine");
        group.bench_with_input(BenchmarkId::new("sawtooth_chain", size), &size, |b, _| {
            b.iter(|| engine.context().render(black_box(&mut buffer)))
        });

        // === PULSE PATCH ===
        // 64-harmonic pulse wavetable through the same chain
        let pulse = EngineConfig::default()
            .with_source(SourceConfig::pulse())
            .start_suspended(false);
        let engine = AudioEngine::offline(pulse).expect("offline engine");
        group.bench_with_input(BenchmarkId::new("pulse_chain", size), &size, |b, _| {
            b.iter(|| engine.context().render(black_box(&mut buffer)))
        });

        // === AUTOMATION ===
        // a scheduled frequency step every block
        let engine = AudioEngine::offline(EngineConfig::default().start_suspended(false))
            .expect("offline engine");
        let mut up = false;
        group.bench_with_input(BenchmarkId::new("scheduled_steps", size), &size, |b, _| {
            b.iter(|| {
                up = !up;
                let frequency = if up { 880.0 } else { 440.0 };
                engine.set_frequency(frequency, 0.0).expect("context open");
                engine.context().render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
