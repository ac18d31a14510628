use std::sync::Arc;

use tracing::debug;

use crate::{
    dsp::periodic_wave::PeriodicWaveTable,
    engine::context::AudioContext,
    error::EngineError,
    graph::{
        analyser::Analyser,
        filter::Filter,
        gain::Gain,
        node::{Ancestral, Ancestry, Destination},
        oscillator::{Oscillator, PeriodicWaveOscillator},
    },
};

/*
Graph Assembly
==============

Graphs are built destination-first: each node is wired into a node that
already exists.

    let analyser = builder.analyser(&context.destination(), 2048, 0.8)?;
    let gain     = builder.gain(&(&analyser).into(), 1.0, false)?;
    let filter   = builder.filter(&(&gain).into(), 10_000.0, 0.0)?;
    let osc      = builder.oscillator(&(&filter).into(), 440.0)?;

Each call allocates the native unit, connects it into the destination, then
runs `attach_child` to record ancestry:

    node          ancestry       parent                    children
    ────────────  ─────────────  ────────────────────────  ──────────
    Analyser      transparent    none (sink has no links)  [Gain]
    Gain          transparent    Analyser's parent: none   [Filter]
    Filter        direct         Gain                      [Oscillator]
    Oscillator    direct         Filter                    []

Transparent stages pass the destination's parent through instead of naming
the destination itself. The destination's children list is always extended.
*/

/// Record `node`'s parent and append it to the destination's children.
///
/// Fails with `AlreadyAttached` if `node` was attached before.
pub fn attach_child(destination: &Destination, node: &Arc<dyn Ancestral>) -> Result<(), EngineError> {
    let parent = destination.node().and_then(|dest| match node.ancestry() {
        Ancestry::Direct => Some(Arc::downgrade(dest)),
        Ancestry::Transparent => dest.links().parent_link(),
    });

    if !node.links().set_parent(parent) {
        return Err(EngineError::AlreadyAttached(node.id()));
    }

    if let Some(dest) = destination.node() {
        dest.links().push_child(Arc::downgrade(node));
    }

    debug!(
        node = ?node.id(),
        kind = ?node.kind(),
        destination = ?destination.input(),
        parent = ?node.parent().map(|p| p.id()),
        "node attached"
    );
    Ok(())
}

/// Builds nodes against one context and keeps them alive.
pub struct GraphBuilder {
    context: AudioContext,
    nodes: Vec<Arc<dyn Ancestral>>,
}

impl GraphBuilder {
    pub fn new(context: &AudioContext) -> Self {
        Self {
            context: context.clone(),
            nodes: Vec::new(),
        }
    }

    pub fn context(&self) -> &AudioContext {
        &self.context
    }

    pub fn analyser(
        &mut self,
        destination: &Destination,
        buffer_length: usize,
        smoothing: f32,
    ) -> Result<Arc<Analyser>, EngineError> {
        let node = Analyser::new(&self.context, destination, buffer_length, smoothing)?;
        self.register(destination, node)
    }

    pub fn gain(
        &mut self,
        destination: &Destination,
        magnitude: f32,
        inverted: bool,
    ) -> Result<Arc<Gain>, EngineError> {
        let node = Gain::new(&self.context, destination, magnitude, inverted)?;
        self.register(destination, node)
    }

    pub fn filter(
        &mut self,
        destination: &Destination,
        cutoff: f32,
        resonance: f32,
    ) -> Result<Arc<Filter>, EngineError> {
        let node = Filter::lowpass(&self.context, destination, cutoff, resonance)?;
        self.register(destination, node)
    }

    pub fn oscillator(
        &mut self,
        destination: &Destination,
        frequency: f32,
    ) -> Result<Arc<Oscillator>, EngineError> {
        let node = Oscillator::new(&self.context, destination, frequency)?;
        self.register(destination, node)
    }

    pub fn periodic_oscillator(
        &mut self,
        destination: &Destination,
        table: &PeriodicWaveTable,
        frequency: f32,
    ) -> Result<Arc<PeriodicWaveOscillator>, EngineError> {
        let node = PeriodicWaveOscillator::new(&self.context, destination, table, frequency)?;
        self.register(destination, node)
    }

    /// Nodes built so far, in construction order.
    pub fn nodes(&self) -> &[Arc<dyn Ancestral>] {
        &self.nodes
    }

    pub fn finish(self) -> Vec<Arc<dyn Ancestral>> {
        self.nodes
    }

    fn register<N: Ancestral + 'static>(
        &mut self,
        destination: &Destination,
        node: Arc<N>,
    ) -> Result<Arc<N>, EngineError> {
        let erased: Arc<dyn Ancestral> = node.clone();
        attach_child(destination, &erased)?;
        self.nodes.push(erased);
        Ok(node)
    }
}
