//! Compressor engines for pressor.
//!
//! Two engines drive a [`SignalGraph`](pressor_core::SignalGraph) of
//! compressor stages:
//!
//! - [`SideChainEngine`] - one channel keyed by an optional side-chain input
//! - [`StereoEngine`] - two channels with optional mid/side processing and
//!   detector linking
//!
//! Both implement [`ChannelEngine`] (block processing, sample-rate reset,
//! parameter dispatch by host index) and
//! [`ParameterInfo`](pressor_core::ParameterInfo) for parameter introspection.
//! [`SharedEngine`] wraps either one for use from a control thread and an
//! audio thread at the same time.
//!
//! # Example
//!
//! ```rust
//! use pressor_engine::{ChannelEngine, SideChainEngine, SideChainParam};
//!
//! let mut engine = SideChainEngine::new(48000.0, 512).unwrap();
//! engine.on_parameter_changed(SideChainParam::Threshold.index(), -20.0);
//! engine.on_parameter_changed(SideChainParam::Ratio.index(), 4.0);
//!
//! let main = vec![0.5; 512];
//! let key: Vec<f64> = (0..512)
//!     .map(|i| (2.0 * std::f64::consts::PI * 1000.0 * i as f64 / 48000.0).sin())
//!     .collect();
//! let mut out = vec![0.0; 512];
//! engine.process(&[&main[..], &key[..]], &mut [&mut out[..]]).unwrap();
//! assert!(engine.gain_reduction_db() < 0.0);
//! ```

pub mod error;
pub mod params;
pub mod routing;
pub mod shared;
pub mod sidechain;
pub mod stereo;

pub use error::EngineError;
pub use params::{Channel, ChannelControl, ParamStore, SideChainParam, StereoParam};
pub use routing::Routing;
pub use shared::SharedEngine;
pub use sidechain::SideChainEngine;
pub use stereo::StereoEngine;

use pressor_core::{GraphError, MAX_PORTS, ParameterInfo, SignalGraph};

/// A compressor engine driven by a host.
///
/// The host calls [`reset`](Self::reset) before streaming and whenever the
/// sample rate changes, forwards every control change to
/// [`on_parameter_changed`](Self::on_parameter_changed), and renders audio
/// with [`process`](Self::process).
pub trait ChannelEngine: ParameterInfo + Send {
    /// Number of input channels the engine reads (side-chain included).
    fn input_channels(&self) -> usize;

    /// Number of output channels the engine writes.
    fn output_channels(&self) -> usize;

    /// Current sample rate.
    fn sample_rate(&self) -> f64;

    /// Applies a new sample rate.
    ///
    /// A no-op when the rate equals the current one; otherwise every
    /// rate-dependent coefficient is recomputed and all stage memory cleared.
    fn reset(&mut self, sample_rate: f64) -> Result<(), EngineError>;

    /// Applies a host control change.
    ///
    /// Values are clamped to the parameter's range; non-finite values and
    /// unknown indices are ignored.
    fn on_parameter_changed(&mut self, index: usize, value: f64);

    /// Renders one block of any length.
    fn process(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) -> Result<(), EngineError>;
}

/// Runs `graph` over `frames` samples in chunks of its maximum block size.
pub(crate) fn process_chunked(
    graph: &mut SignalGraph,
    inputs: &[&[f64]],
    outputs: &mut [&mut [f64]],
    frames: usize,
) -> Result<(), GraphError> {
    let max = graph.max_block_size().max(1);
    let output_count = outputs.len();
    let mut start = 0;
    while start < frames {
        let end = (start + max).min(frames);
        let mut ins: [&[f64]; MAX_PORTS] = Default::default();
        for (slot, input) in ins.iter_mut().zip(inputs) {
            *slot = &input[start..end];
        }
        let mut outs: [&mut [f64]; MAX_PORTS] = Default::default();
        for (slot, output) in outs.iter_mut().zip(outputs.iter_mut()) {
            *slot = &mut output[start..end];
        }
        graph.process(&ins[..inputs.len()], &mut outs[..output_count])?;
        start = end;
    }
    Ok(())
}
