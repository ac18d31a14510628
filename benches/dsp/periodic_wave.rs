//! Benchmarks for coefficient tables and wavetable baking.
//!
//! Baking runs once per source node, off the audio thread, but a slow bake
//! still delays graph assembly.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use waveframe::dsp::periodic_wave::{PeriodicWaveTable, WaveNormalization, Wavetable};

pub fn bench_periodic_wave(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/periodic_wave");

    for &harmonics in &[16usize, 64, 256] {
        group.bench_with_input(
            BenchmarkId::new("pulse_table", harmonics),
            &harmonics,
            |b, &harmonics| b.iter(|| PeriodicWaveTable::pulse(black_box(harmonics), 0.01)),
        );

        let table = PeriodicWaveTable::pulse(harmonics, 0.01);
        group.bench_with_input(BenchmarkId::new("bake", harmonics), &table, |b, table| {
            b.iter(|| Wavetable::bake(black_box(table), WaveNormalization::Disabled))
        });
    }

    group.finish();
}
