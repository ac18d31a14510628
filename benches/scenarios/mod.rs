//! Scenario benchmarks.
//!
//! These model what the oscilloscope does every frame: render the full
//! signal graph, then pull the analyser buffer and frame a window.

mod engine;
mod scope;

pub use engine::bench_engine;
pub use scope::bench_scope;
