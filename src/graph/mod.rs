//! Control-side node tree.
//!
//! Each node owns the handle of one native unit inside the processor and
//! takes part in parent/child bookkeeping. Nodes never render anything
//! themselves; setters only schedule parameter events on the context.

/// Analysis tap exposing time- and frequency-domain data.
pub mod analyser;
/// Destination-first assembly and `attach_child`.
pub mod builder;
/// Low-pass filter node.
pub mod filter;
/// Gain stage with separate magnitude and polarity.
pub mod gain;
/// Capability traits, links and destinations.
pub mod node;
/// Sawtooth and periodic-wave source nodes.
pub mod oscillator;
/// Scheduled parameter handles.
pub mod param;
