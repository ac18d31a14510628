//! The control-side engine handle passed explicitly to every node.

use std::sync::{
    atomic::{AtomicU64, AtomicU8, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use tracing::{debug, info};

use crate::{
    engine::{
        processor::{Processor, UnitKind},
        scheduler::{ParamEvent, ParamKind, Scheduler},
        UnitId,
    },
    error::EngineError,
    graph::node::{Destination, OutputSink},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

impl ContextState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ContextState::Suspended,
            1 => ContextState::Running,
            _ => ContextState::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ContextState::Suspended => 0,
            ContextState::Running => 1,
            ContextState::Closed => 2,
        }
    }
}

/// Run state and frame counter shared between control code and the renderer.
pub struct DeviceClock {
    state: AtomicU8,
    frames: AtomicU64,
}

impl DeviceClock {
    pub fn new(state: ContextState) -> Self {
        Self {
            state: AtomicU8::new(state.as_u8()),
            frames: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> ContextState {
        ContextState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: ContextState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub(crate) fn advance(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::AcqRel);
    }
}

struct ContextInner {
    sample_rate: f32,
    clock: Arc<DeviceClock>,
    processor: Arc<Mutex<Processor>>,
    scheduler: Mutex<Scheduler>,
}

/// Cheap to clone; every clone drives the same engine.
#[derive(Clone)]
pub struct AudioContext {
    inner: Arc<ContextInner>,
}

impl AudioContext {
    /// New context in the suspended state.
    pub fn new(sample_rate: f32) -> Self {
        let clock = Arc::new(DeviceClock::new(ContextState::Suspended));
        let (scheduler, events) = Scheduler::new();
        let processor = Processor::new(sample_rate, clock.clone(), events);

        info!(sample_rate, "audio context created");

        Self {
            inner: Arc::new(ContextInner {
                sample_rate,
                clock,
                processor: Arc::new(Mutex::new(processor)),
                scheduler: Mutex::new(scheduler),
            }),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.inner.sample_rate
    }

    pub fn state(&self) -> ContextState {
        self.inner.clock.state()
    }

    /// Frames rendered while running.
    pub fn current_frame(&self) -> u64 {
        self.inner.clock.frames()
    }

    /// Device time in seconds.
    pub fn current_time(&self) -> f64 {
        self.current_frame() as f64 / self.inner.sample_rate as f64
    }

    /// Start or continue playback. Calling it on a running context is a no-op.
    pub fn resume(&self) -> Result<(), EngineError> {
        match self.state() {
            ContextState::Closed => Err(EngineError::ContextClosed),
            ContextState::Running => Ok(()),
            ContextState::Suspended => {
                self.inner.clock.set_state(ContextState::Running);
                info!(time = self.current_time(), "audio context resumed");
                Ok(())
            }
        }
    }

    pub fn suspend(&self) -> Result<(), EngineError> {
        match self.state() {
            ContextState::Closed => Err(EngineError::ContextClosed),
            ContextState::Suspended => Ok(()),
            ContextState::Running => {
                self.inner.clock.set_state(ContextState::Suspended);
                info!(time = self.current_time(), "audio context suspended");
                Ok(())
            }
        }
    }

    /// Permanently stop rendering. Later graph changes fail with `ContextClosed`.
    pub fn close(&self) {
        if self.state() != ContextState::Closed {
            self.inner.clock.set_state(ContextState::Closed);
            info!("audio context closed");
        }
    }

    /// The terminal output sink.
    pub fn destination(&self) -> Destination {
        Destination::Output(OutputSink)
    }

    /// Allocate a native unit and return its handle.
    pub fn create_unit(&self, kind: UnitKind) -> Result<UnitId, EngineError> {
        self.ensure_open()?;
        let id = self.lock_processor().add_unit(kind);
        debug!(?id, "unit created");
        Ok(id)
    }

    /// Route the output of `from` into the input of `to`.
    pub fn connect(&self, from: UnitId, to: UnitId) -> Result<(), EngineError> {
        self.ensure_open()?;
        let mut processor = self.lock_processor();
        for id in [from, to] {
            if !processor.contains(id) {
                return Err(EngineError::UnknownUnit(id));
            }
        }
        processor.connect(from, to);
        debug!(?from, ?to, "units connected");
        Ok(())
    }

    /// Device frame `offset` seconds after the current time. Negative offsets
    /// mean "now".
    pub fn frame_at(&self, offset: f64) -> u64 {
        let delta = (offset.max(0.0) * self.inner.sample_rate as f64).round() as u64;
        self.current_frame() + delta
    }

    /// Queue a step change of `param` on `unit`, `offset` seconds from now,
    /// and return the device frame it lands on.
    ///
    /// Never blocks and never touches render state. A full queue drops the
    /// event and reports `EventQueueFull`.
    pub fn schedule(
        &self,
        unit: UnitId,
        param: ParamKind,
        value: f32,
        offset: f64,
    ) -> Result<u64, EngineError> {
        self.ensure_open()?;
        let event = ParamEvent {
            unit,
            param,
            value,
            frame: self.frame_at(offset),
        };
        let mut scheduler = self
            .inner
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !scheduler.enqueue(event) {
            return Err(EngineError::EventQueueFull(unit));
        }
        Ok(event.frame)
    }

    /// Shared handle for the audio callback.
    pub fn processor(&self) -> Arc<Mutex<Processor>> {
        self.inner.processor.clone()
    }

    pub fn clock(&self) -> Arc<DeviceClock> {
        self.inner.clock.clone()
    }

    /// Render `out.len()` mono frames on the calling thread.
    pub fn render(&self, out: &mut [f32]) {
        self.lock_processor().render(out);
    }

    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.state() == ContextState::Closed {
            return Err(EngineError::ContextClosed);
        }
        Ok(())
    }

    fn lock_processor(&self) -> MutexGuard<'_, Processor> {
        self.inner
            .processor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioContext")
            .field("sample_rate", &self.inner.sample_rate)
            .field("state", &self.state())
            .field("frame", &self.current_frame())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dsp::oscillator::Waveform, engine::scheduler::EVENT_QUEUE_CAPACITY};

    #[test]
    fn starts_suspended_and_resume_is_idempotent() {
        let context = AudioContext::new(48_000.0);
        assert_eq!(context.state(), ContextState::Suspended);

        context.resume().unwrap();
        context.resume().unwrap();
        assert_eq!(context.state(), ContextState::Running);

        context.suspend().unwrap();
        assert_eq!(context.state(), ContextState::Suspended);
    }

    #[test]
    fn clock_only_moves_while_running() {
        let context = AudioContext::new(48_000.0);
        let mut out = vec![0.0f32; 480];

        context.render(&mut out);
        assert_eq!(context.current_frame(), 0);

        context.resume().unwrap();
        context.render(&mut out);
        assert_eq!(context.current_frame(), 480);
        assert!((context.current_time() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn frame_at_converts_seconds() {
        let context = AudioContext::new(48_000.0);
        assert_eq!(context.frame_at(1.0), 48_000);
        assert_eq!(context.frame_at(-3.0), 0);
    }

    #[test]
    fn closed_context_rejects_graph_changes() {
        let context = AudioContext::new(48_000.0);
        context.close();

        assert!(matches!(context.resume(), Err(EngineError::ContextClosed)));
        assert!(matches!(
            context.create_unit(UnitKind::gain(1.0)),
            Err(EngineError::ContextClosed)
        ));
        assert!(matches!(
            context.schedule(UnitId(1), ParamKind::Gain, 0.5, 0.0),
            Err(EngineError::ContextClosed)
        ));
    }

    #[test]
    fn schedule_reports_target_frame_and_full_queue() {
        let context = AudioContext::new(48_000.0);
        let gain = context.create_unit(UnitKind::gain(1.0)).unwrap();

        assert_eq!(context.schedule(gain, ParamKind::Gain, 0.5, 0.5).unwrap(), 24_000);
        for _ in 1..EVENT_QUEUE_CAPACITY {
            context.schedule(gain, ParamKind::Gain, 0.5, 0.0).unwrap();
        }
        assert!(matches!(
            context.schedule(gain, ParamKind::Gain, 0.5, 0.0),
            Err(EngineError::EventQueueFull(id)) if id == gain
        ));

        // rendering drains the queue, even while suspended
        context.render(&mut [0.0f32; 16]);
        assert!(context.schedule(gain, ParamKind::Gain, 0.5, 0.0).is_ok());
    }

    #[test]
    fn connecting_unknown_unit_fails() {
        let context = AudioContext::new(48_000.0);
        let osc = context
            .create_unit(UnitKind::oscillator(Waveform::Sawtooth, 440.0, 48_000.0))
            .unwrap();

        let err = context.connect(osc, UnitId(42)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownUnit(UnitId(42))));
        assert!(context.connect(osc, UnitId::OUTPUT).is_ok());
    }
}
