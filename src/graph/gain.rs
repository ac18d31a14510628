use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::{
    engine::{context::AudioContext, processor::UnitKind, scheduler::ParamKind, UnitId},
    error::EngineError,
    graph::{
        node::{Ancestral, Ancestry, Destination, NodeKind, NodeLinks, Sinkable},
        param::ParamHandle,
    },
};

/// Magnitude and polarity kept separately so inverting never loses the level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainState {
    magnitude: f32,
    inverted: bool,
}

impl GainState {
    pub fn new(magnitude: f32, inverted: bool) -> Self {
        Self {
            magnitude: magnitude.max(0.0),
            inverted,
        }
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Magnitude × sign.
    pub fn effective(&self) -> f32 {
        if self.inverted {
            -self.magnitude
        } else {
            self.magnitude
        }
    }
}

pub struct Gain {
    id: UnitId,
    links: NodeLinks,
    state: Mutex<GainState>,
    param: ParamHandle,
}

impl Gain {
    pub fn new(
        context: &AudioContext,
        destination: &Destination,
        magnitude: f32,
        inverted: bool,
    ) -> Result<Arc<Self>, EngineError> {
        let state = GainState::new(magnitude, inverted);
        let id = context.create_unit(UnitKind::gain(state.effective()))?;
        context.connect(id, destination.input())?;
        debug!(?id, gain = state.effective(), "gain created");

        Ok(Arc::new(Self {
            id,
            links: NodeLinks::default(),
            state: Mutex::new(state),
            param: ParamHandle::new(context, id, ParamKind::Gain, state.effective()),
        }))
    }

    pub fn state(&self) -> GainState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Effective gain as last requested.
    pub fn gain(&self) -> f32 {
        self.param.value()
    }

    /// Set the magnitude (negative values clamp to 0), keeping the polarity.
    pub fn set_gain(&self, value: f32) -> Result<(), EngineError> {
        self.set_gain_at(value, 0.0)
    }

    pub fn set_gain_at(&self, value: f32, offset: f64) -> Result<(), EngineError> {
        self.update(offset, |state| state.magnitude = value.max(0.0))
    }

    pub fn set_inverted(&self, inverted: bool) -> Result<(), EngineError> {
        self.update(0.0, |state| state.inverted = inverted)
    }

    /// The new state is kept only if its change was queued.
    fn update(&self, offset: f64, change: impl FnOnce(&mut GainState)) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = *state;
        change(&mut next);
        self.param.set_value_at(next.effective(), offset)?;
        *state = next;
        Ok(())
    }
}

impl Sinkable for Gain {
    fn input(&self) -> UnitId {
        self.id
    }
}

impl Ancestral for Gain {
    fn id(&self) -> UnitId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Gain
    }

    fn links(&self) -> &NodeLinks {
        &self.links
    }

    fn ancestry(&self) -> Ancestry {
        Ancestry::Transparent
    }
}
