use std::sync::Arc;

use tracing::debug;

use crate::{
    dsp::filter::FilterKind,
    engine::{context::AudioContext, processor::UnitKind, scheduler::ParamKind, UnitId},
    error::EngineError,
    graph::{
        node::{Ancestral, Destination, NodeKind, NodeLinks, Sinkable},
        param::ParamHandle,
    },
};

/*
Filter Node
===========

Subtractive stage between the source and the gain. Fixed to a low-pass
response: lowering the cutoff removes upper harmonics and darkens the tone.

  cutoff      200 Hz    muffled, like through a wall
              2 kHz     warm
              10 kHz    nearly open (default)

Cutoff is sampled once per render block, so a change lands within one block
of its scheduled time. The renderer clamps it to [10 Hz, 0.49 × sample rate].
*/

pub struct Filter {
    id: UnitId,
    links: NodeLinks,
    cutoff: ParamHandle,
}

impl Filter {
    pub fn lowpass(
        context: &AudioContext,
        destination: &Destination,
        cutoff: f32,
        resonance: f32,
    ) -> Result<Arc<Self>, EngineError> {
        let unit = UnitKind::lowpass(cutoff, resonance, context.sample_rate());
        let id = context.create_unit(unit)?;
        context.connect(id, destination.input())?;
        debug!(?id, cutoff, resonance, "filter created");

        Ok(Arc::new(Self {
            id,
            links: NodeLinks::default(),
            cutoff: ParamHandle::new(context, id, ParamKind::Cutoff, cutoff),
        }))
    }

    pub fn filter_kind(&self) -> FilterKind {
        FilterKind::LowPass
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff.value()
    }

    /// Change the cutoff as soon as possible.
    pub fn set_cutoff(&self, value: f32) -> Result<(), EngineError> {
        self.cutoff.set_value_at(value, 0.0)
    }

    pub fn set_cutoff_at(&self, value: f32, offset: f64) -> Result<(), EngineError> {
        self.cutoff.set_value_at(value, offset)
    }
}

impl Sinkable for Filter {
    fn input(&self) -> UnitId {
        self.id
    }
}

impl Ancestral for Filter {
    fn id(&self) -> UnitId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Filter
    }

    fn links(&self) -> &NodeLinks {
        &self.links
    }
}
