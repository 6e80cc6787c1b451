//! Orthonormal mid/side matrix.
//!
//! ```text
//! out0 = (in0 + in1) · √½
//! out1 = (in0 - in1) · √½
//! ```
//!
//! The matrix is its own inverse, so one stage type serves as both encoder
//! (L/R to M/S) and decoder (M/S to L/R).

use core::f64::consts::FRAC_1_SQRT_2;

use crate::stage::Stage;

/// Mid/side matrix: two inputs, two outputs.
#[derive(Debug, Clone, Default)]
pub struct MidSide;

impl MidSide {
    /// Creates a mid/side matrix.
    pub fn new() -> Self {
        Self
    }
}

impl Stage for MidSide {
    fn input_count(&self) -> usize {
        2
    }

    fn output_count(&self) -> usize {
        2
    }

    fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
        let (first, second) = outputs.split_at_mut(1);
        let (sum, diff) = (&mut *first[0], &mut *second[0]);
        for (i, (&a, &b)) in inputs[0].iter().zip(inputs[1]).enumerate() {
            sum[i] = (a + b) * FRAC_1_SQRT_2;
            diff[i] = (a - b) * FRAC_1_SQRT_2;
        }
    }
}
