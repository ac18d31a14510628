//! Benchmarks for one oscilloscope frame: pull the analyser, pick a window.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use waveframe::{
    AnalyserProfile, AudioEngine, DisplayMode, DisplayWindow, EngineConfig, RenderLoop,
};

pub fn bench_scope(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/scope");

    for profile in [AnalyserProfile::Compact, AnalyserProfile::Detailed] {
        let config = EngineConfig::default()
            .with_profile(profile)
            .start_suspended(false);
        let engine = AudioEngine::offline(config).expect("offline engine");
        let length = profile.buffer_length();

        // fill the analyser history once
        let mut audio = vec![0.0f32; length * 2];
        engine.context().render(&mut audio);

        let mut view = |samples: &[f32], window: DisplayWindow| {
            let _ = black_box(window.slice(samples));
        };

        let mut explicit = RenderLoop::new(engine.analyser().clone(), DisplayMode::default());
        group.bench_with_input(BenchmarkId::new("explicit", length), &length, |b, _| {
            b.iter(|| explicit.tick(&mut view))
        });

        let mut single = RenderLoop::new(engine.analyser().clone(), DisplayMode::SingleCycle);
        group.bench_with_input(BenchmarkId::new("single_cycle", length), &length, |b, _| {
            b.iter(|| single.tick(&mut view))
        });

        let mut spectrum = vec![0.0f32; engine.analyser().frequency_bin_count()];
        group.bench_with_input(BenchmarkId::new("frequency_data", length), &length, |b, _| {
            b.iter(|| engine.analyser().fill_frequency_data(black_box(&mut spectrum)))
        });
    }

    group.finish();
}
