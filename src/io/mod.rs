//! External interfaces: the audio device.

/// cpal output stream driving the processor.
pub mod output;
