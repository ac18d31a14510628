//! Low-level DSP primitives run by the render side of the engine.
//!
//! These components are allocation-free while rendering and know nothing
//! about the node tree: the processor owns one of them per unit and feeds
//! them blocks of samples.

/// State-variable low-pass filter.
pub mod filter;
/// Last-N sample history published to the analyser.
pub mod history;
/// Phase-accumulator oscillator (band-limited sawtooth, wavetable).
pub mod oscillator;
/// Scheduled step automation for unit parameters.
pub mod param;
/// Fourier coefficient tables and baked wavetables.
pub mod periodic_wave;

/// Context passed to units while rendering one block.
///
/// - sample_rate: Device sample rate (e.g., 48000.0)
/// - frame: Device clock position of the first sample in the block
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frame: u64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, frame: u64) -> Self {
        Self { sample_rate, frame }
    }

    /// Device time of the first sample, in seconds.
    pub fn time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }
}
