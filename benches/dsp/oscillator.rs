//! Benchmarks for oscillator waveform generation.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use waveframe::dsp::{
    oscillator::{OscillatorBlock, Waveform},
    periodic_wave::{PeriodicWaveTable, WaveNormalization, Wavetable},
    RenderCtx,
};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let ctx = RenderCtx::new(48_000.0, 0);
    let pulse = Arc::new(Wavetable::bake(
        &PeriodicWaveTable::default(),
        WaveNormalization::Disabled,
    ));

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        let frequencies = vec![440.0f32; size];

        // Sawtooth - ramp plus PolyBLEP correction near the wrap
        let mut osc = OscillatorBlock::new(Waveform::Sawtooth);
        group.bench_with_input(BenchmarkId::new("sawtooth", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(&frequencies), black_box(&ctx));
            })
        });

        // Pulse wavetable - interpolated lookup, level picked per frequency change
        let mut osc = OscillatorBlock::new(Waveform::Periodic(pulse.clone()));
        group.bench_with_input(BenchmarkId::new("pulse_table", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(&frequencies), black_box(&ctx));
            })
        });

        // Gliding pitch - level lookup on every sample
        let glide: Vec<f32> = (0..size).map(|i| 110.0 + i as f32).collect();
        let mut osc = OscillatorBlock::new(Waveform::Periodic(pulse.clone()));
        group.bench_with_input(BenchmarkId::new("pulse_glide", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(&glide), black_box(&ctx));
            })
        });
    }

    group.finish();
}
