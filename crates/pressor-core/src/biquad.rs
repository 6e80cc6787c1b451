//! Biquad (bi-quadratic) filter section.
//!
//! Second-order IIR building block for the detector's band-limiting filter.
//! Coefficient calculation uses the RBJ Audio EQ Cookbook formulas; higher
//! Butterworth orders are built by cascading sections with the Q values
//! from [`butterworth_q`].

use core::f64::consts::PI;
use libm::{cos, sin};

/// Biquad coefficients and state.
///
/// Implements the Direct Form I structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Sets the coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, coeffs: Coefficients) {
        let (b0, b1, b2, a0, a1, a2) = coeffs;
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = crate::flush_denormal(output);

        output
    }

    /// Clears the delay lines without touching the coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw `(b0, b1, b2, a0, a1, a2)` coefficient tuple.
pub type Coefficients = (f64, f64, f64, f64, f64, f64);

/// Low-pass coefficients (RBJ cookbook).
///
/// * `frequency` - Cutoff frequency in Hz
/// * `q` - Q factor (0.707 for a single Butterworth section)
/// * `sample_rate` - Sample rate in Hz
pub fn lowpass_coefficients(frequency: f64, q: f64, sample_rate: f64) -> Coefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cos(omega);
    let alpha = sin(omega) / (2.0 * q);

    let b0 = (1.0 - cos_omega) / 2.0;
    let b1 = 1.0 - cos_omega;
    let b2 = (1.0 - cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// High-pass coefficients (RBJ cookbook).
pub fn highpass_coefficients(frequency: f64, q: f64, sample_rate: f64) -> Coefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cos(omega);
    let alpha = sin(omega) / (2.0 * q);

    let b0 = (1.0 + cos_omega) / 2.0;
    let b1 = -(1.0 + cos_omega);
    let b2 = (1.0 + cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Q of section `k` (0-based) in an even-order Butterworth cascade.
///
/// `Q_k = 1 / (2·sin((2k+1)·π / (2·order)))`. For order 4 this yields
/// 0.5412 and 1.3066.
pub fn butterworth_q(order: usize, section: usize) -> f64 {
    let n = order as f64;
    let k = section as f64;
    1.0 / (2.0 * sin((2.0 * k + 1.0) * PI / (2.0 * n)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_by_default() {
        let mut biquad = Biquad::new();
        assert_eq!(biquad.process(0.75), 0.75);
        assert_eq!(biquad.process(-0.25), -0.25);
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut biquad = Biquad::new();
        biquad.set_coefficients(lowpass_coefficients(1000.0, 0.707, 48000.0));
        let mut out = 0.0;
        for _ in 0..4800 {
            out = biquad.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-6, "DC should pass, got {out}");
    }

    #[test]
    fn highpass_blocks_dc() {
        let mut biquad = Biquad::new();
        biquad.set_coefficients(highpass_coefficients(100.0, 0.707, 48000.0));
        let mut out = 1.0;
        for _ in 0..48000 {
            out = biquad.process(1.0);
        }
        assert!(out.abs() < 1e-4, "DC should be blocked, got {out}");
    }

    #[test]
    fn butterworth_fourth_order_q_values() {
        assert!((butterworth_q(4, 0) - 1.306_563).abs() < 1e-5);
        assert!((butterworth_q(4, 1) - 0.541_196).abs() < 1e-5);
        assert!((butterworth_q(2, 0) - core::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn clear_resets_state() {
        let mut biquad = Biquad::new();
        biquad.set_coefficients(lowpass_coefficients(500.0, 0.707, 48000.0));
        for _ in 0..16 {
            biquad.process(1.0);
        }
        biquad.clear();
        assert_eq!(biquad.process(0.0), 0.0);
    }
}
