//! Fourier-series waveforms: coefficient tables and their baked wavetables.

use std::f64::consts::PI;

use crate::error::EngineError;

/*
Periodic Waves
==============

Any periodic signal can be written as a sum of harmonics:

    x(φ) = Σₙ real[n] · cos(2π·n·φ) + imag[n] · sin(2π·n·φ)      φ ∈ [0, 1)

The (real, imag) pair is the "harmonic coefficient table". Index 0 is the DC
term and is never rendered; indices 1..=H are the harmonics.

Pulse Wave
----------

A pulse that is high (+1) for a fraction d of the cycle (the duty cycle) and
low (-1) for the rest expands to

    a       = 2π · n · d
    real[n] = (2 / (π·n)) · sin(a)
    imag[n] = (2 / (π·n)) · (1 − cos(a))
    real[0] = 2d − 1                     (average level)

At d = 0.5 this is a square wave (even harmonics vanish). At d = 0.01 the
pulse is a narrow click once per cycle, bright and nasal, with harmonic
amplitudes falling off slowly.

Normalization
-------------

A generic periodic-wave generator rescales the table so its peak is 1.0.
The pulse table's absolute scale is intentional, so the graph bakes it with
normalization disabled: a 1% pulse with 64 harmonics peaks near ±2 and the
downstream gain decides the level.

Band Limiting
-------------

Harmonic n of a note at f Hz sits at n·f Hz. Anything above Nyquist folds
back as aliasing. The wavetable therefore stores one level per harmonic limit
(H, H/2, H/4, ..., 1); the oscillator picks the richest level whose top
harmonic still fits below Nyquist.

  level 0:  harmonics 1..=64     used up to f = nyquist / 64
  level 1:  harmonics 1..=32     used up to f = nyquist / 32
  ...
  level 6:  harmonic  1          fundamental only
*/

/// Highest harmonic index in the default pulse table.
pub const DEFAULT_HARMONICS: usize = 64;
/// Duty cycle of the default pulse table.
pub const DEFAULT_DUTY_CYCLE: f32 = 0.01;
/// Samples per baked cycle.
pub const TABLE_SIZE: usize = 2048;

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicWaveTable {
    real: Vec<f32>,
    imag: Vec<f32>,
}

impl PeriodicWaveTable {
    /// Custom table. Both sequences must have the same length (H + 1, H ≥ 1).
    pub fn new(real: Vec<f32>, imag: Vec<f32>) -> Result<Self, EngineError> {
        if real.len() != imag.len() || real.len() < 2 {
            return Err(EngineError::CoefficientMismatch {
                real: real.len(),
                imag: imag.len(),
            });
        }
        Ok(Self { real, imag })
    }

    /// Pulse wave of duty cycle `duty` approximated with `harmonics` harmonics.
    ///
    /// Total over `harmonics ≥ 1` and `duty ∈ (0, 1)`; identical inputs
    /// always produce identical tables.
    pub fn pulse(harmonics: usize, duty: f32) -> Self {
        let duty = duty as f64;
        let mut real = vec![0.0f32; harmonics + 1];
        let mut imag = vec![0.0f32; harmonics + 1];

        real[0] = (2.0 * duty - 1.0) as f32;

        for n in 1..=harmonics {
            let a = 2.0 * PI * n as f64 * duty;
            let scale = 2.0 / (PI * n as f64);
            real[n] = (scale * a.sin()) as f32;
            imag[n] = (scale * (1.0 - a.cos())) as f32;
        }

        Self { real, imag }
    }

    pub fn real(&self) -> &[f32] {
        &self.real
    }

    pub fn imag(&self) -> &[f32] {
        &self.imag
    }

    /// Highest harmonic index H.
    pub fn harmonics(&self) -> usize {
        self.real.len() - 1
    }

    /// Informational DC term, never rendered.
    pub fn dc(&self) -> f32 {
        self.real[0]
    }
}

impl Default for PeriodicWaveTable {
    fn default() -> Self {
        Self::pulse(DEFAULT_HARMONICS, DEFAULT_DUTY_CYCLE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveNormalization {
    /// Scale so the full-band peak is 1.0.
    Enabled,
    /// Keep the coefficients' absolute scale.
    Disabled,
}

/// A baked, band-limited single-cycle waveform.
#[derive(Debug, Clone)]
pub struct Wavetable {
    /// (highest harmonic, samples) pairs, richest level first.
    levels: Vec<(usize, Vec<f32>)>,
}

impl Wavetable {
    pub fn bake(table: &PeriodicWaveTable, normalization: WaveNormalization) -> Self {
        let mut levels = Vec::new();
        let mut limit = table.harmonics().max(1);
        loop {
            levels.push((limit, synthesize(table, limit)));
            if limit == 1 {
                break;
            }
            limit /= 2;
        }

        if normalization == WaveNormalization::Enabled {
            let peak = levels[0]
                .1
                .iter()
                .fold(0.0f32, |acc, &x| acc.max(x.abs()));
            if peak > 0.0 {
                for (_, samples) in &mut levels {
                    samples.iter_mut().for_each(|s| *s /= peak);
                }
            }
        }

        Self { levels }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Richest level whose top harmonic stays below Nyquist at `frequency`.
    pub fn level_for(&self, frequency: f32, sample_rate: f32) -> usize {
        let nyquist = sample_rate * 0.5;
        self.levels
            .iter()
            .position(|&(limit, _)| limit as f32 * frequency.abs() < nyquist)
            .unwrap_or(self.levels.len() - 1)
    }

    pub fn level(&self, index: usize) -> &[f32] {
        &self.levels[index.min(self.levels.len() - 1)].1
    }

    /// Linear-interpolated lookup, `phase` in [0, 1).
    #[inline]
    pub fn sample(&self, level: usize, phase: f32) -> f32 {
        let samples = self.level(level);
        let position = phase * TABLE_SIZE as f32;
        let index = position as usize % TABLE_SIZE;
        let next = (index + 1) % TABLE_SIZE;
        let frac = position - position.floor();
        samples[index] + (samples[next] - samples[index]) * frac
    }
}

fn synthesize(table: &PeriodicWaveTable, limit: usize) -> Vec<f32> {
    let top = limit.min(table.harmonics());
    (0..TABLE_SIZE)
        .map(|k| {
            let phase = k as f64 / TABLE_SIZE as f64;
            let value: f64 = (1..=top)
                .map(|n| {
                    let w = 2.0 * PI * n as f64 * phase;
                    table.real[n] as f64 * w.cos() + table.imag[n] as f64 * w.sin()
                })
                .sum();
            value as f32
        })
        .collect()
}
