//! Soft-knee gain computer: detector power in, linear gain out.
//!
//! With `d = 10·log10(P / T)` the gain in dB is
//!
//! ```text
//! gain_db = -(sqrt(d² + S) + d) / 2 · (1 - 1/R)
//! ```
//!
//! which is 0 well below the threshold, `-d·(1 - 1/R)` well above it and a
//! smooth hyperbola in between whose width grows with the softness `S`.
//! `S = 0` gives a hard knee with no reduction at or below the threshold.

use libm::{log10, pow, sqrt};

use crate::math::db_to_power;
use crate::stage::Stage;

/// Gain computer stage: one input (power), one output (gain in (0, 1]).
#[derive(Debug, Clone)]
pub struct GainComputer {
    threshold: f64,
    ratio: f64,
    softness: f64,
}

impl GainComputer {
    /// Creates a transparent computer: threshold 0 dB, ratio 1, softness 1e-4.
    pub fn new() -> Self {
        Self {
            threshold: 1.0,
            ratio: 1.0,
            softness: 1e-4,
        }
    }

    /// Sets the threshold in the power domain (`10^(dB/10)`).
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = if threshold.is_finite() && threshold > 0.0 {
            threshold
        } else {
            f64::MIN_POSITIVE
        };
    }

    /// Sets the threshold from decibels.
    pub fn set_threshold_db(&mut self, threshold_db: f64) {
        self.set_threshold(db_to_power(threshold_db));
    }

    /// Sets the ratio (slope). Values below 1 are clamped to 1.
    pub fn set_ratio(&mut self, ratio: f64) {
        self.ratio = if ratio.is_finite() { ratio.max(1.0) } else { 1.0 };
    }

    /// Sets the knee softness `S` (squared-dB units, clamped to `>= 0`).
    pub fn set_softness(&mut self, softness: f64) {
        self.softness = if softness.is_finite() { softness.max(0.0) } else { 0.0 };
    }

    /// Power-domain threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Ratio.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Knee softness.
    pub fn softness(&self) -> f64 {
        self.softness
    }

    /// Linear gain for a detector power value.
    #[inline]
    pub fn gain_for_power(&self, power: f64) -> f64 {
        if !(power > 0.0) {
            return 1.0;
        }
        let d = 10.0 * log10(power / self.threshold);
        let slope = (self.ratio - 1.0) / self.ratio;
        pow(10.0, -(sqrt(d * d + self.softness) + d) / 40.0 * slope)
    }
}

impl Default for GainComputer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for GainComputer {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
        for (out, &power) in outputs[0].iter_mut().zip(inputs[0]) {
            *out = self.gain_for_power(power);
        }
    }
}
