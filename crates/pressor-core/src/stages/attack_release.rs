//! Asymmetric one-pole smoother.
//!
//! ```text
//! c    = release_coeff  if x[n] >= y[n-1]
//!        attack_coeff   otherwise
//! y[n] = c * y[n-1] + (1 - c) * x[n]
//! ```
//!
//! The compressor engines place this stage after the gain computer, so it
//! smooths the gain signal: falling gain takes the attack branch, recovering
//! gain takes the release branch. Coefficients come from
//! [`time_constant_coeff`] and are recomputed on every sample-rate change.

use crate::math::{flush_denormal, time_constant_coeff};
use crate::stage::Stage;

/// Attack/release smoother: one input, one output.
#[derive(Debug, Clone)]
pub struct AttackRelease {
    attack_ms: f64,
    release_ms: f64,
    attack_coeff: f64,
    release_coeff: f64,
    initial: f64,
    state: f64,
    sample_rate: f64,
}

impl AttackRelease {
    /// Creates a smoother with 10 ms attack and release, starting at `initial`.
    pub fn new(sample_rate: f64, initial: f64) -> Self {
        let mut smoother = Self {
            attack_ms: 10.0,
            release_ms: 10.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            initial,
            state: initial,
            sample_rate,
        };
        smoother.recalculate();
        smoother
    }

    /// Sets the time constant used while the input is below the output.
    pub fn set_attack_ms(&mut self, attack_ms: f64) {
        self.attack_ms = attack_ms;
        self.attack_coeff = time_constant_coeff(attack_ms, self.sample_rate);
    }

    /// Sets the time constant used while the input is at or above the output.
    pub fn set_release_ms(&mut self, release_ms: f64) {
        self.release_ms = release_ms;
        self.release_coeff = time_constant_coeff(release_ms, self.sample_rate);
    }

    /// Attack time in milliseconds.
    pub fn attack_ms(&self) -> f64 {
        self.attack_ms
    }

    /// Release time in milliseconds.
    pub fn release_ms(&self) -> f64 {
        self.release_ms
    }

    /// Coefficient of the falling branch.
    pub fn attack_coeff(&self) -> f64 {
        self.attack_coeff
    }

    /// Coefficient of the rising branch.
    pub fn release_coeff(&self) -> f64 {
        self.release_coeff
    }

    /// Last output value.
    pub fn last_output(&self) -> f64 {
        self.state
    }

    fn recalculate(&mut self) {
        self.attack_coeff = time_constant_coeff(self.attack_ms, self.sample_rate);
        self.release_coeff = time_constant_coeff(self.release_ms, self.sample_rate);
    }
}

impl Stage for AttackRelease {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
        let mut state = self.state;
        for (out, &x) in outputs[0].iter_mut().zip(inputs[0]) {
            let coeff = if x >= state {
                self.release_coeff
            } else {
                self.attack_coeff
            };
            state = flush_denormal(coeff * state + (1.0 - coeff) * x);
            *out = state;
        }
        self.state = state;
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.recalculate();
    }

    fn reset(&mut self) {
        self.state = self.initial;
    }
}
