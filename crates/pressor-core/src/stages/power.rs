//! Instantaneous power estimator (leaky integrator of the squared signal).
//!
//! ```text
//! power[n] = m * power[n-1] + (1 - m) * x[n]²
//! ```
//!
//! With `m = 0` the output is exactly `x[n]²`.

use crate::math::{flush_denormal, time_constant_coeff};
use crate::stage::Stage;

/// How the memory coefficient `m` is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerMemory {
    /// Fixed coefficient in `[0, 1)`, independent of the sample rate.
    Fixed(f64),
    /// Time constant in milliseconds: `m = exp(-1 / (ms·1e-3·fs))`.
    TimeConstantMs(f64),
}

/// Power estimator stage: one input, one output, output always `>= 0`.
#[derive(Debug, Clone)]
pub struct PowerEstimator {
    memory: PowerMemory,
    coeff: f64,
    state: f64,
    sample_rate: f64,
}

impl PowerEstimator {
    /// Creates an estimator with a fixed memory coefficient.
    ///
    /// `memory` is clamped to `[0, 1)`.
    pub fn with_memory(memory: f64) -> Self {
        let mut estimator = Self {
            memory: PowerMemory::Fixed(memory),
            coeff: 0.0,
            state: 0.0,
            sample_rate: 0.0,
        };
        estimator.recalculate();
        estimator
    }

    /// Creates an estimator whose memory follows a time constant.
    pub fn with_time_constant_ms(time_ms: f64, sample_rate: f64) -> Self {
        let mut estimator = Self {
            memory: PowerMemory::TimeConstantMs(time_ms),
            coeff: 0.0,
            state: 0.0,
            sample_rate,
        };
        estimator.recalculate();
        estimator
    }

    /// Replaces the memory setting.
    pub fn set_memory(&mut self, memory: PowerMemory) {
        self.memory = memory;
        self.recalculate();
    }

    /// Effective memory coefficient `m`.
    pub fn coefficient(&self) -> f64 {
        self.coeff
    }

    /// Last output value.
    pub fn last_power(&self) -> f64 {
        self.state
    }

    fn recalculate(&mut self) {
        self.coeff = match self.memory {
            PowerMemory::Fixed(m) if m.is_finite() => m.clamp(0.0, 1.0 - f64::EPSILON),
            PowerMemory::Fixed(_) => 0.0,
            PowerMemory::TimeConstantMs(ms) => time_constant_coeff(ms, self.sample_rate),
        };
    }
}

impl Stage for PowerEstimator {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
        let m = self.coeff;
        let mut state = self.state;
        for (out, &x) in outputs[0].iter_mut().zip(inputs[0]) {
            state = flush_denormal(m * state + (1.0 - m) * x * x);
            *out = state;
        }
        self.state = state;
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.recalculate();
    }

    fn reset(&mut self) {
        self.state = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_memory_is_instantaneous() {
        let mut power = PowerEstimator::with_memory(0.0);
        let input = [0.5, -1.0, 0.25, 0.0, -0.75];
        let mut out = [0.0; 5];
        power.process_block(&[&input], &mut [&mut out]);
        for (o, i) in out.iter().zip(input) {
            assert_eq!(*o, i * i);
        }
    }

    #[test]
    fn time_constant_tracks_sample_rate() {
        let mut power = PowerEstimator::with_time_constant_ms(1.0, 48000.0);
        let at_48k = power.coefficient();
        assert!((at_48k - libm::exp(-1.0 / 48.0)).abs() < 1e-15);
        power.set_sample_rate(96000.0);
        assert!(power.coefficient() > at_48k);
    }

    #[test]
    fn converges_to_mean_square() {
        let mut power = PowerEstimator::with_time_constant_ms(1.0, 48000.0);
        let input = [0.5; 4800];
        let mut out = [0.0; 4800];
        power.process_block(&[&input], &mut [&mut out]);
        assert!((out[4799] - 0.25).abs() < 1e-9);
        assert!(out.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn state_persists_and_resets() {
        let mut power = PowerEstimator::with_memory(0.5);
        let mut out = [0.0; 1];
        power.process_block(&[&[1.0]], &mut [&mut out]);
        assert_eq!(out[0], 0.5);
        power.process_block(&[&[1.0]], &mut [&mut out]);
        assert_eq!(out[0], 0.75);
        power.reset();
        assert_eq!(power.last_power(), 0.0);
    }

    #[test]
    fn fixed_memory_is_clamped() {
        assert_eq!(PowerEstimator::with_memory(-3.0).coefficient(), 0.0);
        assert!(PowerEstimator::with_memory(2.0).coefficient() < 1.0);
        assert_eq!(PowerEstimator::with_memory(f64::NAN).coefficient(), 0.0);
    }
}
