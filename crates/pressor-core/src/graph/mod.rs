//! Signal graph for the compressor engines.
//!
//! A [`SignalGraph`] is an arena of [`NodeKind`] stages addressed by
//! [`NodeId`]. Each input port is bound to one [`Source`] (another node's
//! output or an external input channel), and graph outputs are bindings of
//! the same kind. Engines build their nodes once and afterwards only rebind
//! ports and change stage coefficients.
//!
//! # Evaluation
//!
//! Blocks are pull-evaluated: nodes reachable from the graph outputs run in
//! dependency order, each writing into its own preallocated
//! [`OutputBuffers`]. Rebinding marks the order dirty; the order is rebuilt
//! on the next block without allocating.
//!
//! # no_std Support
//!
//! This module is `no_std` compatible with `alloc`.

pub mod buffer;
pub mod node;
mod processing;

pub use buffer::OutputBuffers;
pub use node::{GraphStage, NodeId, NodeKind, Source};
pub use processing::{GraphError, SamplingContext, SignalGraph};
