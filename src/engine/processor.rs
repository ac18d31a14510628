//! Render side of the engine: the unit tree pulled from the output sink.

use std::{mem, sync::Arc};

use rtrb::Consumer;

use crate::{
    dsp::{
        filter::{max_cutoff, SVFilter, MIN_CUTOFF_HZ},
        history::HistoryWriter,
        oscillator::{OscillatorBlock, Waveform},
        param::AudioParam,
        RenderCtx,
    },
    engine::{
        context::{ContextState, DeviceClock},
        scheduler::{ParamEvent, ParamKind},
        UnitId,
    },
    MAX_BLOCK_SIZE,
};

/*
Pull Rendering
==============

Units form a tree rooted at the output sink (unit 0). Each unit's input is
the sum of the units connected into it.

    Oscillator ──▶ Filter ──▶ Gain ──▶ Analyser ──▶ Output

The render order is the post-order walk from the sink, recomputed whenever
a connection changes:

    [Oscillator, Filter, Gain, Analyser, Output]

Per block every unit clears its buffer, sums its inputs into it and then
processes in place. The sink's buffer is the block that leaves the engine.

Clock
-----

The device clock (in frames) only moves while the context is running. A
suspended or closed context renders silence, but parameter events still
drain into the unit timelines so they take effect once playback resumes.
*/

/// Native processing unit, one per graph node plus the output sink.
pub enum UnitKind {
    Output,
    Oscillator {
        block: OscillatorBlock,
        frequency: AudioParam,
    },
    Filter {
        filter: SVFilter,
        cutoff: AudioParam,
    },
    Gain {
        gain: AudioParam,
    },
    Analyser {
        history: HistoryWriter,
    },
}

impl UnitKind {
    /// Source unit. Frequency is clamped to [0, Nyquist].
    pub fn oscillator(waveform: Waveform, frequency: f32, sample_rate: f32) -> Self {
        UnitKind::Oscillator {
            block: OscillatorBlock::new(waveform),
            frequency: AudioParam::new(frequency, 0.0, sample_rate * 0.5),
        }
    }

    /// Low-pass unit. Cutoff is clamped to [10 Hz, 0.49 × sample rate].
    pub fn lowpass(cutoff: f32, resonance: f32, sample_rate: f32) -> Self {
        let mut filter = SVFilter::lowpass(cutoff);
        filter.set_resonance(resonance);
        UnitKind::Filter {
            filter,
            cutoff: AudioParam::new(cutoff, MIN_CUTOFF_HZ, max_cutoff(sample_rate)),
        }
    }

    pub fn gain(value: f32) -> Self {
        UnitKind::Gain {
            gain: AudioParam::new(value, f32::MIN, f32::MAX),
        }
    }

    pub fn analyser(history: HistoryWriter) -> Self {
        UnitKind::Analyser { history }
    }

    fn param_mut(&mut self, kind: ParamKind) -> Option<&mut AudioParam> {
        match (self, kind) {
            (UnitKind::Oscillator { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (UnitKind::Filter { cutoff, .. }, ParamKind::Cutoff) => Some(cutoff),
            (UnitKind::Gain { gain }, ParamKind::Gain) => Some(gain),
            _ => None,
        }
    }

    /// Process one block in place. `scratch` holds per-sample parameter values.
    fn process(&mut self, block: &mut [f32], scratch: &mut [f32], ctx: &RenderCtx) {
        match self {
            UnitKind::Output => {}
            UnitKind::Oscillator { block: osc, frequency } => {
                frequency.fill(scratch, ctx.frame);
                osc.render(block, scratch, ctx);
            }
            UnitKind::Filter { filter, cutoff } => {
                filter.set_cutoff(cutoff.block_value(ctx.frame));
                filter.render(block, ctx);
            }
            UnitKind::Gain { gain } => {
                gain.fill(scratch, ctx.frame);
                for (sample, &g) in block.iter_mut().zip(scratch.iter()) {
                    *sample *= g;
                }
            }
            UnitKind::Analyser { history } => history.write(block),
        }
    }
}

struct Unit {
    kind: UnitKind,
    inputs: Vec<usize>,
    buffer: Vec<f32>,
}

impl Unit {
    fn new(kind: UnitKind) -> Self {
        Self {
            kind,
            inputs: Vec::new(),
            buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }
}

pub struct Processor {
    sample_rate: f32,
    clock: Arc<DeviceClock>,
    events: Consumer<ParamEvent>,
    units: Vec<Unit>,
    order: Vec<usize>,
    scratch: Vec<f32>,
}

impl Processor {
    pub(crate) fn new(
        sample_rate: f32,
        clock: Arc<DeviceClock>,
        events: Consumer<ParamEvent>,
    ) -> Self {
        Self {
            sample_rate,
            clock,
            events,
            units: vec![Unit::new(UnitKind::Output)],
            order: vec![UnitId::OUTPUT.index()],
            scratch: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn contains(&self, id: UnitId) -> bool {
        id.index() < self.units.len()
    }

    pub(crate) fn add_unit(&mut self, kind: UnitKind) -> UnitId {
        self.units.push(Unit::new(kind));
        UnitId((self.units.len() - 1) as u32)
    }

    /// Route `from`'s output into `to`'s input. Callers check both ids exist.
    pub(crate) fn connect(&mut self, from: UnitId, to: UnitId) {
        let inputs = &mut self.units[to.index()].inputs;
        if !inputs.contains(&from.index()) {
            inputs.push(from.index());
        }
        self.rebuild_order();
    }

    /// Unit indices in render order, output sink last.
    pub fn render_order(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.order.iter().map(|&index| UnitId(index as u32))
    }

    fn rebuild_order(&mut self) {
        let mut visited = vec![false; self.units.len()];
        let mut order = Vec::with_capacity(self.units.len());
        post_order(&self.units, UnitId::OUTPUT.index(), &mut visited, &mut order);
        self.order = order;
    }

    /// Render mono output into `out`, any length.
    pub fn render(&mut self, out: &mut [f32]) {
        self.apply_events();

        if self.clock.state() != ContextState::Running {
            out.fill(0.0);
            return;
        }

        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            let ctx = RenderCtx::new(self.sample_rate, self.clock.frames());
            self.render_block(chunk.len(), &ctx);
            chunk.copy_from_slice(&self.units[UnitId::OUTPUT.index()].buffer[..chunk.len()]);
            self.clock.advance(chunk.len() as u64);
        }
    }

    fn apply_events(&mut self) {
        while let Ok(event) = self.events.pop() {
            let Some(unit) = self.units.get_mut(event.unit.index()) else {
                continue;
            };
            if let Some(param) = unit.kind.param_mut(event.param) {
                param.schedule(event.frame, event.value);
            }
        }
    }

    fn render_block(&mut self, len: usize, ctx: &RenderCtx) {
        for position in 0..self.order.len() {
            let index = self.order[position];
            let mut buffer = mem::take(&mut self.units[index].buffer);
            let block = &mut buffer[..len];
            block.fill(0.0);

            for &input in &self.units[index].inputs {
                for (sample, &incoming) in block.iter_mut().zip(&self.units[input].buffer[..len]) {
                    *sample += incoming;
                }
            }

            self.units[index]
                .kind
                .process(block, &mut self.scratch[..len], ctx);
            self.units[index].buffer = buffer;
        }
    }
}

fn post_order(units: &[Unit], index: usize, visited: &mut [bool], order: &mut Vec<usize>) {
    if visited[index] {
        return;
    }
    visited[index] = true;
    for &input in &units[index].inputs {
        post_order(units, input, visited, order);
    }
    order.push(index);
}
