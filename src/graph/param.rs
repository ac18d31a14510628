use std::sync::{Mutex, PoisonError};

use crate::{
    engine::{context::AudioContext, scheduler::ParamKind, UnitId},
    error::EngineError,
};

/// Accepted steps, mirrored from what the render side will apply.
struct Timeline {
    /// Value in effect before the first pending step.
    settled: f32,
    /// Last accepted request, whatever its frame.
    requested: f32,
    /// Pending (frame, value) steps sorted by frame.
    steps: Vec<(u64, f32)>,
}

impl Timeline {
    fn push(&mut self, frame: u64, value: f32) {
        let index = self.steps.partition_point(|&(at, _)| at <= frame);
        self.steps.insert(index, (frame, value));
        self.requested = value;
    }

    fn value_at(&mut self, frame: u64) -> f32 {
        let due = self.steps.partition_point(|&(at, _)| at <= frame);
        if due > 0 {
            self.settled = self.steps[due - 1].1;
            self.steps.drain(..due);
        }
        self.settled
    }
}

/// Control-side handle to one parameter of a native unit.
///
/// Tracks every accepted change so callers can read back both the last
/// requested value and the one playing at the current device time.
pub struct ParamHandle {
    context: AudioContext,
    unit: UnitId,
    kind: ParamKind,
    timeline: Mutex<Timeline>,
}

impl ParamHandle {
    pub fn new(context: &AudioContext, unit: UnitId, kind: ParamKind, initial: f32) -> Self {
        Self {
            context: context.clone(),
            unit,
            kind,
            timeline: Mutex::new(Timeline {
                settled: initial,
                requested: initial,
                steps: Vec::new(),
            }),
        }
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Last accepted value, before render-side clamping. May still be
    /// waiting for its frame.
    pub fn value(&self) -> f32 {
        self.lock().requested
    }

    /// Value in effect at the current device frame, before clamping.
    pub fn current_value(&self) -> f32 {
        let now = self.context.current_frame();
        self.lock().value_at(now)
    }

    /// Step to `value` at `offset` seconds from the current device time.
    /// Nothing is recorded unless the change was queued.
    pub fn set_value_at(&self, value: f32, offset: f64) -> Result<(), EngineError> {
        let mut timeline = self.lock();
        let frame = self.context.schedule(self.unit, self.kind, value, offset)?;
        timeline.push(frame, value);
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Timeline> {
        self.timeline.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ParamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamHandle")
            .field("unit", &self.unit)
            .field("kind", &self.kind)
            .field("value", &self.value())
            .finish()
    }
}
