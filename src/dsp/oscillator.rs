use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::{periodic_wave::Wavetable, RenderCtx};

/*
Oscillator Block
================

A phase accumulator plus a waveform shape.

    phase += frequency / sample_rate       wraps in [0, 1)
    out    = shape(phase)

Sawtooth
--------

The naive ramp 2·φ − 1 jumps from +1 to −1 once per cycle. That step
contains energy at every frequency and aliases badly at high notes. PolyBLEP
subtracts a two-sample polynomial residual around the jump so the step
looks band-limited:

        naive            polyblep-corrected
      ╱│  ╱│            ╱╲   ╱╲
     ╱ │ ╱ │           ╱  ╲ ╱  ╲        (corner rounded over ~2 samples)
    ╱  │╱  │          ╱    ╲    ╲

The phase starts at 0.5 so the first output sample is 0 and the ramp rises
from there.

Periodic
--------

Reads a baked `Wavetable`, picking the level whose harmonics all fit below
Nyquist for the current frequency.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveformKind {
    Sawtooth,
    CustomPeriodic,
}

#[derive(Debug, Clone)]
pub enum Waveform {
    Sawtooth,
    Periodic(Arc<Wavetable>),
}

impl Waveform {
    pub fn kind(&self) -> WaveformKind {
        match self {
            Waveform::Sawtooth => WaveformKind::Sawtooth,
            Waveform::Periodic(_) => WaveformKind::CustomPeriodic,
        }
    }
}

pub struct OscillatorBlock {
    phase: f32,
    waveform: Waveform,
}

impl OscillatorBlock {
    pub fn new(waveform: Waveform) -> Self {
        let phase = match waveform {
            Waveform::Sawtooth => 0.5,
            Waveform::Periodic(_) => 0.0,
        };
        Self { phase, waveform }
    }

    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    /// Fill `out` using one frequency per sample from `frequencies`.
    pub fn render(&mut self, out: &mut [f32], frequencies: &[f32], ctx: &RenderCtx) {
        match &self.waveform {
            Waveform::Sawtooth => {
                for (sample, &freq) in out.iter_mut().zip(frequencies) {
                    let dt = freq / ctx.sample_rate;
                    *sample = 2.0 * self.phase - 1.0 - poly_blep(self.phase, dt);
                    self.phase = wrap(self.phase + dt);
                }
            }
            Waveform::Periodic(table) => {
                let mut last_freq = f32::NAN;
                let mut level = 0;
                for (sample, &freq) in out.iter_mut().zip(frequencies) {
                    if freq != last_freq {
                        level = table.level_for(freq, ctx.sample_rate);
                        last_freq = freq;
                    }
                    *sample = table.sample(level, self.phase);
                    self.phase = wrap(self.phase + freq / ctx.sample_rate);
                }
            }
        }
    }
}

#[inline]
fn wrap(phase: f32) -> f32 {
    let wrapped = phase - phase.floor();
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Polynomial band-limited step residual at phase `t` for increment `dt`.
#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return 0.0;
    }

    if t < dt {
        let x = t / dt;
        2.0 * x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + 2.0 * x + 1.0
    } else {
        0.0
    }
}
