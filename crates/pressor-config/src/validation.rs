//! Range validation of settings against the engines' parameter descriptors.
//!
//! Engines clamp whatever they are given; a settings file is checked first so
//! that a typo such as `threshold = 20` is reported instead of silently
//! becoming 0 dB.
//!
//! # Example
//!
//! ```rust
//! use pressor_config::validation::validate_param_value;
//! use pressor_engine::SideChainParam;
//!
//! let ratio = SideChainParam::Ratio.descriptor();
//! assert!(validate_param_value(&ratio, 4.0).is_ok());
//! assert!(validate_param_value(&ratio, 0.5).is_err());
//! ```

use pressor_core::ParamDescriptor;
use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Stable string id of the parameter.
        param: &'static str,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Parameter value is NaN or infinite.
    #[error("parameter '{0}' is not a finite number")]
    NotFinite(&'static str),

    /// Sample rate not finite and positive.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),

    /// Maximum block size of zero.
    #[error("invalid maximum block size: {0}")]
    InvalidBlockSize(usize),

    /// Engines captured together run at different sample rates.
    #[error("sample rate mismatch: side-chain engine at {sidechain} Hz, stereo engine at {stereo} Hz")]
    SampleRateMismatch {
        /// Side-chain engine rate.
        sidechain: f64,
        /// Stereo engine rate.
        stereo: f64,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Checks one plain value against a descriptor's range.
pub fn validate_param_value(descriptor: &ParamDescriptor, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite(descriptor.string_id));
    }
    if descriptor.contains(value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            param: descriptor.string_id,
            value,
            min: descriptor.min,
            max: descriptor.max,
        })
    }
}

/// Checks the engine construction arguments.
pub fn validate_engine_setup(sample_rate: f64, max_block_size: usize) -> ValidationResult<()> {
    let mut errors = Vec::new();
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        errors.push(ValidationError::InvalidSampleRate(sample_rate));
    }
    if max_block_size == 0 {
        errors.push(ValidationError::InvalidBlockSize(max_block_size));
    }
    collect(errors)
}

/// Folds a list of errors into one result.
pub fn collect(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressor_engine::{SideChainParam, StereoParam};

    #[test]
    fn accepts_range_edges() {
        let threshold = SideChainParam::Threshold.descriptor();
        assert!(validate_param_value(&threshold, -40.0).is_ok());
        assert!(validate_param_value(&threshold, 0.0).is_ok());
    }

    #[test]
    fn reports_out_of_range_with_id() {
        let threshold = SideChainParam::Threshold.descriptor();
        let err = validate_param_value(&threshold, 6.0).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                param: "sc_threshold",
                value: 6.0,
                min: -40.0,
                max: 0.0,
            }
        );
        assert_eq!(
            err.to_string(),
            "parameter 'sc_threshold' value 6 out of range [-40, 0]"
        );
    }

    #[test]
    fn rejects_non_finite() {
        let mix = StereoParam::DryWet.descriptor();
        assert_eq!(
            validate_param_value(&mix, f64::NAN),
            Err(ValidationError::NotFinite("st_dry_wet"))
        );
    }

    #[test]
    fn engine_setup_collects_every_problem() {
        assert!(validate_engine_setup(44100.0, 256).is_ok());
        assert_eq!(
            validate_engine_setup(-1.0, 256),
            Err(ValidationError::InvalidSampleRate(-1.0))
        );
        match validate_engine_setup(0.0, 0) {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected two errors, got {other:?}"),
        }
    }

    #[test]
    fn multiple_display_joins_messages() {
        let err = ValidationError::Multiple(vec![
            ValidationError::InvalidBlockSize(0),
            ValidationError::NotFinite("sc_ratio"),
        ]);
        assert_eq!(
            err.to_string(),
            "multiple validation errors: invalid maximum block size: 0; parameter 'sc_ratio' is not a finite number"
        );
    }
}
