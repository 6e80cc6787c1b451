//! The [`Stage`] trait implemented by every node of the signal graph.
//!
//! A stage transforms up to [`MAX_PORTS`] input blocks into up to
//! [`MAX_PORTS`] output blocks of the same length. Stages keep only their
//! coefficients and recursive memory between calls, never the blocks
//! themselves.
//!
//! - **Block-based**: one call per host block, slices of equal length.
//! - **No allocations**: `process_block` runs on the audio thread.
//! - **Rate-aware**: [`Stage::set_sample_rate`] recomputes every
//!   rate-dependent coefficient.

/// Maximum number of input ports and of outputs on a single stage.
pub const MAX_PORTS: usize = 2;

/// A block-processing node of the signal graph.
///
/// # Example
///
/// ```rust
/// use pressor_core::Stage;
///
/// struct Invert;
///
/// impl Stage for Invert {
///     fn input_count(&self) -> usize { 1 }
///     fn output_count(&self) -> usize { 1 }
///
///     fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
///         for (out, inp) in outputs[0].iter_mut().zip(inputs[0]) {
///             *out = -inp;
///         }
///     }
/// }
///
/// let mut stage = Invert;
/// let mut out = [0.0; 2];
/// stage.process_block(&[&[1.0, -2.0]], &mut [&mut out]);
/// assert_eq!(out, [-1.0, 2.0]);
/// ```
pub trait Stage {
    /// Number of input ports.
    fn input_count(&self) -> usize;

    /// Number of outputs.
    fn output_count(&self) -> usize;

    /// Processes one block.
    ///
    /// `inputs.len() == input_count()`, `outputs.len() == output_count()`,
    /// and every slice has the same length.
    fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]);

    /// Recomputes sample-rate-dependent coefficients.
    ///
    /// Default does nothing (rate-independent stages).
    fn set_sample_rate(&mut self, _sample_rate: f64) {}

    /// Clears recursive memory without changing parameters.
    fn reset(&mut self) {}
}

/// Errors reported by stage configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageError {
    /// A filter cutoff was not a finite positive frequency.
    InvalidCutoff(f64),
    /// The sample rate was not a finite positive number.
    InvalidSampleRate(f64),
}

#[cfg(feature = "std")]
impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidCutoff(hz) => write!(f, "invalid cutoff frequency {hz} Hz"),
            Self::InvalidSampleRate(rate) => write!(f, "invalid sample rate {rate} Hz"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StageError {}
