//! The engine: context, render processor and the assembled default graph.

/// Explicit engine handle: clock, run state, units, parameter queue.
pub mod context;
/// Render side pulled by the output stream.
pub mod processor;
/// Control → render parameter events.
pub mod scheduler;

use std::sync::Arc;

use tracing::info;

use crate::{
    config::{EngineConfig, SourceConfig},
    dsp::{oscillator::WaveformKind, periodic_wave::PeriodicWaveTable},
    error::EngineError,
    graph::{
        analyser::Analyser,
        builder::GraphBuilder,
        filter::Filter,
        gain::Gain,
        node::{Ancestral, Destination},
        oscillator::SourceNode,
    },
    io::output::OutputStream,
};

use self::context::{AudioContext, ContextState};

/// Handle of a native unit inside the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u32);

impl UnitId {
    /// The terminal output sink.
    pub const OUTPUT: UnitId = UnitId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The assembled signal chain:
///
/// ```text
/// Source ──▶ Filter (low-pass) ──▶ Gain ──▶ Analyser ──▶ Output
/// ```
///
/// Built destination-first so every node can be wired to an existing one.
/// The engine owns the nodes; parent/child links between them are weak.
pub struct AudioEngine {
    context: AudioContext,
    analyser: Arc<Analyser>,
    gain: Arc<Gain>,
    filter: Arc<Filter>,
    source: Arc<dyn SourceNode>,
    nodes: Vec<Arc<dyn Ancestral>>,
    stream: Option<OutputStream>,
}

impl AudioEngine {
    /// Build the graph and drive it from the default output device.
    pub fn with_default_output(config: EngineConfig) -> Result<Self, EngineError> {
        let (stream, context) = OutputStream::open_default()?;
        let mut engine = Self::build(context, &config)?;
        engine.stream = Some(stream);
        Ok(engine)
    }

    /// Build the graph without a device; drive it with `AudioContext::render`.
    pub fn offline(config: EngineConfig) -> Result<Self, EngineError> {
        let context = AudioContext::new(config.sample_rate);
        Self::build(context, &config)
    }

    fn build(context: AudioContext, config: &EngineConfig) -> Result<Self, EngineError> {
        let mut builder = GraphBuilder::new(&context);

        let analyser = builder.analyser(
            &context.destination(),
            config.analyser.buffer_length(),
            config.smoothing_time_constant,
        )?;
        let gain = builder.gain(&Destination::from(&analyser), config.gain, config.inverted)?;
        let filter = builder.filter(&Destination::from(&gain), config.cutoff_hz, config.resonance)?;

        let filter_dest = Destination::from(&filter);
        let source: Arc<dyn SourceNode> = match config.source {
            SourceConfig::Sawtooth => {
                builder.oscillator(&filter_dest, config.frequency_hz)? as Arc<dyn SourceNode>
            }
            SourceConfig::Pulse { duty, harmonics } => builder.periodic_oscillator(
                &filter_dest,
                &PeriodicWaveTable::pulse(harmonics.max(1), duty),
                config.frequency_hz,
            )?,
        };

        if !config.start_suspended {
            context.resume()?;
        }

        info!(
            sample_rate = context.sample_rate(),
            source = ?source.waveform(),
            nodes = builder.nodes().len(),
            "signal graph assembled"
        );

        Ok(Self {
            nodes: builder.finish(),
            context,
            analyser,
            gain,
            filter,
            source,
            stream: None,
        })
    }

    pub fn context(&self) -> &AudioContext {
        &self.context
    }

    pub fn analyser(&self) -> &Arc<Analyser> {
        &self.analyser
    }

    pub fn gain(&self) -> &Arc<Gain> {
        &self.gain
    }

    pub fn filter(&self) -> &Arc<Filter> {
        &self.filter
    }

    pub fn source(&self) -> &Arc<dyn SourceNode> {
        &self.source
    }

    /// Every node of the graph in construction order (analyser first).
    pub fn nodes(&self) -> &[Arc<dyn Ancestral>] {
        &self.nodes
    }

    pub fn waveform(&self) -> WaveformKind {
        self.source.waveform()
    }

    pub fn state(&self) -> ContextState {
        self.context.state()
    }

    pub fn is_live(&self) -> bool {
        self.stream.is_some()
    }

    pub fn resume(&self) -> Result<(), EngineError> {
        self.context.resume()
    }

    pub fn suspend(&self) -> Result<(), EngineError> {
        self.context.suspend()
    }

    /// Source frequency change `offset` seconds from now.
    pub fn set_frequency(&self, value: f32, offset: f64) -> Result<(), EngineError> {
        self.source.set_frequency(value, offset)
    }

    pub fn set_cutoff(&self, value: f32) -> Result<(), EngineError> {
        self.filter.set_cutoff(value)
    }

    pub fn set_gain(&self, value: f32) -> Result<(), EngineError> {
        self.gain.set_gain(value)
    }

    pub fn set_inverted(&self, inverted: bool) -> Result<(), EngineError> {
        self.gain.set_inverted(inverted)
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.context.close();
    }
}
