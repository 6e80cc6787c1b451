//! Error types for the compressor engines.

use pressor_core::{GraphError, StageError};
use thiserror::Error;

/// Errors returned by engine construction, reset and processing.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum EngineError {
    /// Sample rate was zero, negative or not finite.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),

    /// Maximum block size was zero.
    #[error("invalid maximum block size: {0}")]
    InvalidBlockSize(usize),

    /// Wrong number of input or output channels.
    #[error("expected {expected} channels, found {found}")]
    ChannelCount {
        /// Channels the engine accepts.
        expected: usize,
        /// Channels supplied.
        found: usize,
    },

    /// Channel slices of one block differ in length.
    #[error("channel length {found} does not match block length {expected}")]
    BlockLength {
        /// Length of the main input.
        expected: usize,
        /// Length of the mismatching slice.
        found: usize,
    },

    /// Signal graph rejected an operation.
    #[error("signal graph error: {0}")]
    Graph(#[from] GraphError),

    /// A stage rejected its configuration.
    #[error("stage error: {0}")]
    Stage(#[from] StageError),
}

/// Checks that `sample_rate` is finite and positive.
pub(crate) fn check_sample_rate(sample_rate: f64) -> Result<f64, EngineError> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(sample_rate)
    } else {
        Err(EngineError::InvalidSampleRate(sample_rate))
    }
}

/// Checks that every slice has the length of the first input; returns it.
pub(crate) fn check_block_length(
    inputs: &[&[f64]],
    outputs: &[&mut [f64]],
) -> Result<usize, EngineError> {
    let frames = inputs.first().map_or(0, |c| c.len());
    let lengths = inputs.iter().map(|c| c.len()).chain(outputs.iter().map(|c| c.len()));
    for found in lengths {
        if found != frames {
            return Err(EngineError::BlockLength {
                expected: frames,
                found,
            });
        }
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_rates() {
        assert!(check_sample_rate(48000.0).is_ok());
        assert_eq!(check_sample_rate(0.0), Err(EngineError::InvalidSampleRate(0.0)));
        assert!(check_sample_rate(-1.0).is_err());
        assert!(check_sample_rate(f64::INFINITY).is_err());
        assert!(check_sample_rate(f64::NAN).is_err());
    }

    #[test]
    fn detects_length_mismatch() {
        let a = [0.0; 4];
        let b = [0.0; 3];
        let mut out = [0.0; 4];
        assert_eq!(check_block_length(&[&a], &[&mut out]), Ok(4));
        assert_eq!(
            check_block_length(&[&a, &b], &[&mut out]),
            Err(EngineError::BlockLength { expected: 4, found: 3 })
        );
    }

    #[test]
    fn wraps_core_errors() {
        let err: EngineError = GraphError::CycleDetected.into();
        assert_eq!(err.to_string(), "signal graph error: binding would create a cycle");
        let err: EngineError = StageError::InvalidCutoff(-1.0).into();
        assert!(err.to_string().contains("cutoff"));
    }
}
