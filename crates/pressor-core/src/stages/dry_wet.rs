//! Crossfade between processed and unprocessed signal.

use crate::stage::Stage;

/// Port carrying the processed signal.
pub const PROCESSED_PORT: usize = 0;
/// Port carrying the unprocessed reference.
pub const DRY_PORT: usize = 1;

/// Dry/wet mixer: `out = w · in0 + (1 - w) · in1`.
///
/// `w = 1` passes the processed port unchanged, `w = 0` the dry port.
#[derive(Debug, Clone)]
pub struct DryWet {
    wet: f64,
}

impl DryWet {
    /// Creates a fully wet mixer.
    pub fn new() -> Self {
        Self { wet: 1.0 }
    }

    /// Sets the processed-signal weight, clamped to `[0, 1]`.
    pub fn set_wet(&mut self, wet: f64) {
        if wet.is_finite() {
            self.wet = wet.clamp(0.0, 1.0);
        }
    }

    /// Processed-signal weight.
    pub fn wet(&self) -> f64 {
        self.wet
    }
}

impl Default for DryWet {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for DryWet {
    fn input_count(&self) -> usize {
        2
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
        let processed = inputs[PROCESSED_PORT];
        let dry = inputs[DRY_PORT];
        let out = &mut *outputs[0];
        // Exact copies at the extremes keep 0/1 bit-transparent.
        if self.wet >= 1.0 {
            out.copy_from_slice(&processed[..out.len()]);
        } else if self.wet <= 0.0 {
            out.copy_from_slice(&dry[..out.len()]);
        } else {
            let wet = self.wet;
            let dry_weight = 1.0 - wet;
            for ((o, &p), &d) in out.iter_mut().zip(processed).zip(dry) {
                *o = wet * p + dry_weight * d;
            }
        }
    }
}
