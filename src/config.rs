//! Engine configuration.
//!
//! Everything the engine needs to assemble its graph lives here. Defaults
//! match the reference patch: a 440 Hz sawtooth through a 10 kHz low-pass at
//! unity gain, captured by a 2048-sample analyser.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::periodic_wave::{DEFAULT_DUTY_CYCLE, DEFAULT_HARMONICS};

/// Default sample rate used for offline rendering when no device is involved.
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;

/// Size of the analyser window.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyserProfile {
    /// 2048 samples: smooth waveform, several cycles of a low note.
    #[default]
    Detailed,
    /// 512 samples: cheaper, better for high notes.
    Compact,
}

impl AnalyserProfile {
    pub fn buffer_length(self) -> usize {
        match self {
            AnalyserProfile::Detailed => 2048,
            AnalyserProfile::Compact => 512,
        }
    }
}

/// Which source node drives the graph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SourceConfig {
    /// Built-in band-limited sawtooth.
    #[default]
    Sawtooth,
    /// Pulse wave synthesized from a Fourier coefficient table.
    Pulse { duty: f32, harmonics: usize },
}

impl SourceConfig {
    pub fn pulse() -> Self {
        SourceConfig::Pulse {
            duty: DEFAULT_DUTY_CYCLE,
            harmonics: DEFAULT_HARMONICS,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Only used by offline engines; device engines adopt the device rate.
    pub sample_rate: f32,
    pub analyser: AnalyserProfile,
    /// Frequency-domain smoothing, 0.0 (none) to just below 1.0.
    pub smoothing_time_constant: f32,
    pub source: SourceConfig,
    pub frequency_hz: f32,
    pub cutoff_hz: f32,
    /// Filter resonance, 0.0 is a plain 12 dB/oct slope.
    pub resonance: f32,
    pub gain: f32,
    pub inverted: bool,
    /// Start in the suspended state; sound only flows after `resume()`.
    pub start_suspended: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            analyser: AnalyserProfile::default(),
            smoothing_time_constant: 0.8,
            source: SourceConfig::default(),
            frequency_hz: 440.0,
            cutoff_hz: 10_000.0,
            resonance: 0.0,
            gain: 1.0,
            inverted: false,
            start_suspended: true,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_profile(mut self, profile: AnalyserProfile) -> Self {
        self.analyser = profile;
        self
    }

    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.source = source;
        self
    }

    pub fn with_frequency(mut self, frequency_hz: f32) -> Self {
        self.frequency_hz = frequency_hz;
        self
    }

    pub fn with_cutoff(mut self, cutoff_hz: f32) -> Self {
        self.cutoff_hz = cutoff_hz;
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn start_suspended(mut self, suspended: bool) -> Self {
        self.start_suspended = suspended;
        self
    }
}
