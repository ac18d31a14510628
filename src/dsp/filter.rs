use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::RenderCtx;

/*
State-Variable Low-Pass
=======================

The graph's filter stage is fixed to a low-pass response: it passes the
fundamental and low harmonics of the source and rolls off everything above
the cutoff at 12 dB/octave.

  cutoff      20 Hz    barely open, almost silent for audio-rate sources
              1 kHz    warm, the sawtooth loses its buzz
              10 kHz   nearly transparent (default)

Topology
--------

A TPT (topology-preserving transform) state-variable filter: two trapezoidal
integrators in a feedback loop. The same two state variables yield low-,
band- and high-pass outputs at once; this unit only reads the low-pass tap.

  g = tan(π · fc / fs)          prewarped integrator gain
  k = 2 − 2 · resonance         damping (2 = no peak)

Cutoff is clamped to [10 Hz, 0.49 · fs] before computing g, since tan()
diverges at Nyquist.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    #[default]
    LowPass,
}

pub const MIN_CUTOFF_HZ: f32 = 10.0;

/// Largest usable cutoff for a given sample rate.
#[inline]
pub fn max_cutoff(sample_rate: f32) -> f32 {
    sample_rate * 0.49
}

pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    cutoff_hz: f32,
    resonance: f32,
    kind: FilterKind,
}

impl SVFilter {
    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            resonance: 0.0,
            kind: FilterKind::LowPass,
        }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    #[inline]
    fn compute_g(&self, ctx: &RenderCtx) -> f32 {
        let cutoff = self
            .cutoff_hz
            .clamp(MIN_CUTOFF_HZ, max_cutoff(ctx.sample_rate));
        (TAU * cutoff / (2.0 * ctx.sample_rate)).tan()
    }

    /// Returns (lowpass, bandpass) for one input sample.
    #[inline]
    fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> (f32, f32) {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        (v2, v1)
    }

    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        let g = self.compute_g(ctx);
        let k = 2.0 - (2.0 * self.resonance);

        for sample in buffer.iter_mut() {
            let (lowpass, _) = self.next_sample(*sample, k, g);
            *sample = match self.kind {
                FilterKind::LowPass => lowpass,
            };
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff_hz = cutoff;
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 0.99);
    }
}
