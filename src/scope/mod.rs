//! Oscilloscope logic: period detection, window selection and the
//! per-frame render loop. Drawing itself belongs to a `WaveformView`.

/// Zero-crossing period detection.
pub mod period;
/// Render loop, sample taps and cancellation.
pub mod render_loop;
/// Display-window selection.
pub mod window;
