//! Band-limiting filter for the level detector.
//!
//! A 4th-order Butterworth high-pass at the low cut in series with a
//! 4th-order Butterworth low-pass at the high cut, each built from two
//! [`Biquad`] sections. Only the side-chain detector uses it: the audio that
//! gets attenuated is never filtered.

use crate::biquad::{Biquad, butterworth_q, highpass_coefficients, lowpass_coefficients};
use crate::stage::{Stage, StageError};

/// Filter order of each half (high-pass and low-pass).
pub const BAND_FILTER_ORDER: usize = 4;

const SECTIONS: usize = BAND_FILTER_ORDER / 2;

/// Highest usable cutoff as a fraction of the sample rate.
const MAX_CUTOFF_RATIO: f64 = 0.49;

/// Lowest usable cutoff in Hz.
const MIN_CUTOFF_HZ: f64 = 1.0;

/// Band-pass stage: one input, one output.
#[derive(Debug, Clone)]
pub struct BandFilter {
    highpass: [Biquad; SECTIONS],
    lowpass: [Biquad; SECTIONS],
    low_cut: f64,
    high_cut: f64,
    sample_rate: f64,
}

impl BandFilter {
    /// Creates a filter passing 20 Hz to 20 kHz (clamped below Nyquist).
    pub fn new(sample_rate: f64) -> Self {
        let mut filter = Self {
            highpass: [Biquad::new(), Biquad::new()],
            lowpass: [Biquad::new(), Biquad::new()],
            low_cut: 20.0,
            high_cut: 20000.0,
            sample_rate,
        };
        filter.recalculate();
        filter
    }

    /// Sets both cutoffs and the sample rate in one step.
    ///
    /// Callers pass `low_cut_hz <= high_cut_hz`; the engines take the min and
    /// max of the two raw controls so inverted sliders stay well-formed.
    pub fn configure(
        &mut self,
        low_cut_hz: f64,
        high_cut_hz: f64,
        sample_rate: f64,
    ) -> Result<(), StageError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(StageError::InvalidSampleRate(sample_rate));
        }
        for hz in [low_cut_hz, high_cut_hz] {
            if !(hz.is_finite() && hz > 0.0) {
                return Err(StageError::InvalidCutoff(hz));
            }
        }
        self.low_cut = low_cut_hz;
        self.high_cut = high_cut_hz;
        self.sample_rate = sample_rate;
        self.recalculate();
        Ok(())
    }

    /// Sets both cutoffs at the current sample rate.
    pub fn set_cut_frequencies(&mut self, low_cut_hz: f64, high_cut_hz: f64) -> Result<(), StageError> {
        self.configure(low_cut_hz, high_cut_hz, self.sample_rate)
    }

    /// Requested low cutoff in Hz.
    pub fn low_cut(&self) -> f64 {
        self.low_cut
    }

    /// Requested high cutoff in Hz.
    pub fn high_cut(&self) -> f64 {
        self.high_cut
    }

    /// Cutoffs actually used, after clamping to the usable band.
    pub fn effective_cutoffs(&self) -> (f64, f64) {
        let nyquist_limit = self.sample_rate * MAX_CUTOFF_RATIO;
        let high = self.high_cut.clamp(MIN_CUTOFF_HZ, nyquist_limit);
        let low = self.low_cut.clamp(MIN_CUTOFF_HZ, high);
        (low, high)
    }

    fn recalculate(&mut self) {
        if !(self.sample_rate > 0.0) {
            return;
        }
        let (low, high) = self.effective_cutoffs();
        for (k, section) in self.highpass.iter_mut().enumerate() {
            let q = butterworth_q(BAND_FILTER_ORDER, k);
            section.set_coefficients(highpass_coefficients(low, q, self.sample_rate));
        }
        for (k, section) in self.lowpass.iter_mut().enumerate() {
            let q = butterworth_q(BAND_FILTER_ORDER, k);
            section.set_coefficients(lowpass_coefficients(high, q, self.sample_rate));
        }
    }

    #[inline]
    fn tick(&mut self, input: f64) -> f64 {
        let mut x = input;
        for section in self.highpass.iter_mut().chain(self.lowpass.iter_mut()) {
            x = section.process(x);
        }
        x
    }
}

impl Stage for BandFilter {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
        for (out, &inp) in outputs[0].iter_mut().zip(inputs[0]) {
            *out = self.tick(inp);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.recalculate();
    }

    fn reset(&mut self) {
        for section in self.highpass.iter_mut().chain(self.lowpass.iter_mut()) {
            section.clear();
        }
    }
}
