//! Error type shared by the engine, the graph builder and the output stream.

use thiserror::Error;

use crate::engine::UnitId;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no default output device available")]
    NoOutputDevice,

    #[error("failed to query device name: {0}")]
    DeviceName(#[from] cpal::DeviceNameError),

    #[error("failed to fetch default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported device sample format: {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),

    #[error("audio context is closed")]
    ContextClosed,

    #[error("unit {0:?} does not exist in this context")]
    UnknownUnit(UnitId),

    #[error("parameter queue full; change to unit {0:?} dropped")]
    EventQueueFull(UnitId),

    #[error("node {0:?} is already attached to a destination")]
    AlreadyAttached(UnitId),

    #[error("coefficient tables must have matching lengths of at least 2 (real: {real}, imag: {imag})")]
    CoefficientMismatch { real: usize, imag: usize },
}
