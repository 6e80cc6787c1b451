//! Fixed gain stage, configured in decibels.

use crate::math::db_to_linear;
use crate::stage::Stage;

/// Volume stage: `out[n] = 10^(dB/20) * in[n]`.
#[derive(Debug, Clone)]
pub struct Volume {
    volume_db: f64,
    linear: f64,
}

impl Volume {
    /// Creates a unity-gain stage.
    pub fn new() -> Self {
        Self {
            volume_db: 0.0,
            linear: 1.0,
        }
    }

    /// Sets the gain in decibels. Non-finite values are ignored.
    pub fn set_volume_db(&mut self, volume_db: f64) {
        if volume_db.is_finite() {
            self.volume_db = volume_db;
            self.linear = db_to_linear(volume_db);
        }
    }

    /// Gain in decibels.
    pub fn volume_db(&self) -> f64 {
        self.volume_db
    }

    /// Linear gain factor.
    pub fn linear_gain(&self) -> f64 {
        self.linear
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for Volume {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
        let gain = self.linear;
        for (out, &x) in outputs[0].iter_mut().zip(inputs[0]) {
            *out = gain * x;
        }
    }
}
