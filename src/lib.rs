pub mod config; // Engine tunables
pub mod dsp;
pub mod engine; // Context, processor, assembled graph
pub mod error;
pub mod graph; // Control-side node tree
pub mod io;
pub mod scope; // Period detection and display windows

pub const MAX_BLOCK_SIZE: usize = 2048;

pub use config::{AnalyserProfile, EngineConfig, SourceConfig};
pub use engine::{
    context::{AudioContext, ContextState},
    AudioEngine, UnitId,
};
pub use error::EngineError;
pub use scope::{
    period::detect_period,
    render_loop::{CancelToken, RenderLoop, SampleTap, WaveformView},
    window::{select_window, DisplayMode, DisplayWindow},
};
