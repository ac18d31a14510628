use std::sync::Arc;

use tracing::debug;

use crate::{
    dsp::{
        oscillator::{Waveform, WaveformKind},
        periodic_wave::{PeriodicWaveTable, WaveNormalization, Wavetable},
    },
    engine::{context::AudioContext, processor::UnitKind, scheduler::ParamKind, UnitId},
    error::EngineError,
    graph::{
        node::{Ancestral, Destination, NodeKind, NodeLinks},
        param::ParamHandle,
    },
};

/*
Source Nodes
============

The head of the chain. A source has no input; it only feeds its
destination.

  Oscillator               built-in sawtooth, bright and buzzy, all harmonics
                           falling off as 1/n
  PeriodicWaveOscillator   waveform baked from a (real, imag) harmonic table,
                           by default a 1% pulse with 64 harmonics

Frequency changes are scheduled on the device clock:

  osc.set_frequency(1000.0, 1.0)?;    // one second from now
  osc.set_frequency(220.0, 0.0)?;     // as soon as possible

Values outside [0, Nyquist] are clamped by the renderer.
*/

/// Shared control surface of every source node.
pub trait SourceNode: Ancestral {
    /// Step the frequency to `value` Hz, `offset` seconds from now.
    fn set_frequency(&self, value: f32, offset: f64) -> Result<(), EngineError>;

    /// Last requested frequency, which may still be scheduled ahead.
    fn frequency(&self) -> f32;

    /// Frequency playing at the current device time.
    fn current_frequency(&self) -> f32;

    fn waveform(&self) -> WaveformKind;
}

pub struct Oscillator {
    id: UnitId,
    links: NodeLinks,
    frequency: ParamHandle,
}

impl Oscillator {
    /// Allocate a sawtooth unit and connect it into `destination`.
    pub fn new(
        context: &AudioContext,
        destination: &Destination,
        frequency: f32,
    ) -> Result<Arc<Self>, EngineError> {
        let id = create_source(context, destination, Waveform::Sawtooth, frequency)?;
        debug!(?id, frequency, "oscillator created");

        Ok(Arc::new(Self {
            id,
            links: NodeLinks::default(),
            frequency: ParamHandle::new(context, id, ParamKind::Frequency, frequency),
        }))
    }
}

impl Ancestral for Oscillator {
    fn id(&self) -> UnitId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Oscillator
    }

    fn links(&self) -> &NodeLinks {
        &self.links
    }
}

impl SourceNode for Oscillator {
    fn set_frequency(&self, value: f32, offset: f64) -> Result<(), EngineError> {
        self.frequency.set_value_at(value, offset)
    }

    fn frequency(&self) -> f32 {
        self.frequency.value()
    }

    fn current_frequency(&self) -> f32 {
        self.frequency.current_value()
    }

    fn waveform(&self) -> WaveformKind {
        WaveformKind::Sawtooth
    }
}

pub struct PeriodicWaveOscillator {
    id: UnitId,
    links: NodeLinks,
    frequency: ParamHandle,
    table: PeriodicWaveTable,
}

impl PeriodicWaveOscillator {
    /// Bake `table` without normalization and connect the unit into
    /// `destination`.
    pub fn new(
        context: &AudioContext,
        destination: &Destination,
        table: &PeriodicWaveTable,
        frequency: f32,
    ) -> Result<Arc<Self>, EngineError> {
        let wave = Arc::new(Wavetable::bake(table, WaveNormalization::Disabled));
        let levels = wave.level_count();
        let id = create_source(context, destination, Waveform::Periodic(wave), frequency)?;
        debug!(?id, frequency, harmonics = table.harmonics(), levels, "periodic oscillator created");

        Ok(Arc::new(Self {
            id,
            links: NodeLinks::default(),
            frequency: ParamHandle::new(context, id, ParamKind::Frequency, frequency),
            table: table.clone(),
        }))
    }

    pub fn table(&self) -> &PeriodicWaveTable {
        &self.table
    }
}

impl Ancestral for PeriodicWaveOscillator {
    fn id(&self) -> UnitId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::PeriodicWaveOscillator
    }

    fn links(&self) -> &NodeLinks {
        &self.links
    }
}

impl SourceNode for PeriodicWaveOscillator {
    fn set_frequency(&self, value: f32, offset: f64) -> Result<(), EngineError> {
        self.frequency.set_value_at(value, offset)
    }

    fn frequency(&self) -> f32 {
        self.frequency.value()
    }

    fn current_frequency(&self) -> f32 {
        self.frequency.current_value()
    }

    fn waveform(&self) -> WaveformKind {
        WaveformKind::CustomPeriodic
    }
}

fn create_source(
    context: &AudioContext,
    destination: &Destination,
    waveform: Waveform,
    frequency: f32,
) -> Result<UnitId, EngineError> {
    let unit = UnitKind::oscillator(waveform, frequency, context.sample_rate());
    let id = context.create_unit(unit)?;
    context.connect(id, destination.input())?;
    Ok(id)
}
