//! Multiplies a signal by a gain signal, sample by sample.

use crate::stage::Stage;

/// Port carrying the linear gain.
pub const GAIN_PORT: usize = 0;
/// Port carrying the signal to attenuate.
pub const SIGNAL_PORT: usize = 1;

/// Gain applier: `out[n] = in0[n] * in1[n]`.
///
/// Port 0 is the gain, port 1 the dry signal.
#[derive(Debug, Clone, Default)]
pub struct GainApplier;

impl GainApplier {
    /// Creates a gain applier.
    pub fn new() -> Self {
        Self
    }
}

impl Stage for GainApplier {
    fn input_count(&self) -> usize {
        2
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
        let gain = inputs[GAIN_PORT];
        let signal = inputs[SIGNAL_PORT];
        for ((out, &g), &x) in outputs[0].iter_mut().zip(gain).zip(signal) {
            *out = g * x;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplies_ports() {
        let mut applier = GainApplier::new();
        let mut out = [0.0; 3];
        applier.process_block(&[&[0.5, 1.0, 0.0], &[2.0, -3.0, 7.0]], &mut [&mut out]);
        assert_eq!(out, [1.0, -3.0, 0.0]);
    }
}
