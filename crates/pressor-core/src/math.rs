//! Level and time-constant conversions used by the compressor stages.
//!
//! All functions are allocation-free and `no_std` compatible.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - amplitude domain (20·log10)
//! - [`db_to_power`] / [`power_to_db`] - power domain (10·log10)
//!
//! # Smoothing
//!
//! - [`time_constant_coeff`] - one-pole decay coefficient from milliseconds
//! - [`flush_denormal`] - zero out values near the subnormal range

use libm::{exp, log10, pow};

/// Smallest time constant accepted by [`time_constant_coeff`], in milliseconds.
pub const MIN_TIME_MS: f64 = 1e-3;

/// Convert decibels to linear amplitude gain: `10^(dB/20)`.
///
/// # Example
/// ```rust
/// use pressor_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 1e-12);
/// assert!((db_to_linear(-6.0206) - 0.5).abs() < 1e-4);
/// ```
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    pow(10.0, db / 20.0)
}

/// Convert linear amplitude gain to decibels.
///
/// Inputs at or below zero are floored at 1e-20 (-400 dB).
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    20.0 * log10(linear.max(1e-20))
}

/// Convert decibels to a power ratio: `10^(dB/10)`.
///
/// Thresholds are stored in the power domain because the detector works on
/// squared samples.
///
/// ```rust
/// use pressor_core::db_to_power;
///
/// assert!((db_to_power(-10.0) - 0.1).abs() < 1e-12);
/// ```
#[inline]
pub fn db_to_power(db: f64) -> f64 {
    pow(10.0, db / 10.0)
}

/// Convert a power ratio to decibels. Non-positive input floors at -400 dB.
#[inline]
pub fn power_to_db(power: f64) -> f64 {
    10.0 * log10(power.max(1e-40))
}

/// One-pole decay coefficient for a time constant given in milliseconds.
///
/// `coeff = exp(-1 / (ms · 1e-3 · sample_rate))`
///
/// The result lies in (0, 1) and grows monotonically with `time_ms`.
/// `time_ms` is clamped to [`MIN_TIME_MS`] and a non-positive sample rate
/// yields 0 (no memory) so the formula can never produce NaN.
///
/// ```rust
/// use pressor_core::time_constant_coeff;
///
/// let fast = time_constant_coeff(1.0, 48000.0);
/// let slow = time_constant_coeff(100.0, 48000.0);
/// assert!(0.0 < fast && fast < slow && slow < 1.0);
/// ```
#[inline]
pub fn time_constant_coeff(time_ms: f64, sample_rate: f64) -> f64 {
    if !(sample_rate > 0.0) {
        return 0.0;
    }
    let time_ms = if time_ms.is_finite() {
        time_ms.max(MIN_TIME_MS)
    } else {
        MIN_TIME_MS
    };
    exp(-1.0 / (time_ms * 1e-3 * sample_rate))
}

/// Flush values close to zero to exactly zero.
///
/// Recursive smoothers decay toward zero forever; below 1e-30 the value is
/// replaced by 0.0 before it reaches the subnormal range.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f64) -> f64 {
    if x.abs() < 1e-30 { 0.0 } else { x }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_linear_roundtrip() {
        let original = 0.5;
        let back = db_to_linear(linear_to_db(original));
        assert!((original - back).abs() < 1e-12, "{original} -> {back}");
    }

    #[test]
    fn power_known_values() {
        assert!((db_to_power(0.0) - 1.0).abs() < 1e-12);
        assert!((db_to_power(-20.0) - 0.01).abs() < 1e-12);
        assert!((power_to_db(100.0) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn power_to_db_floors_non_positive() {
        assert!(power_to_db(0.0).is_finite());
        assert!(power_to_db(-1.0).is_finite());
    }

    #[test]
    fn coeff_matches_formula() {
        let coeff = time_constant_coeff(10.0, 48000.0);
        let expected = (-1.0f64 / (10.0 * 1e-3 * 48000.0)).exp();
        assert!((coeff - expected).abs() < 1e-15);
    }

    #[test]
    fn coeff_guards_bad_input() {
        assert_eq!(time_constant_coeff(10.0, 0.0), 0.0);
        assert_eq!(time_constant_coeff(10.0, -44100.0), 0.0);
        let c = time_constant_coeff(0.0, 48000.0);
        assert!(c.is_finite() && (0.0..1.0).contains(&c));
        let c = time_constant_coeff(f64::NAN, 48000.0);
        assert!(c.is_finite());
    }

    #[test]
    fn flush_denormal_zeroes_tiny_values() {
        assert_eq!(flush_denormal(1e-35), 0.0);
        assert_eq!(flush_denormal(-1e-35), 0.0);
        assert_eq!(flush_denormal(0.25), 0.25);
    }
}
