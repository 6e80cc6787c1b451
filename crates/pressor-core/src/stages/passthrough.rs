//! Trivial routing stages: sum and identity.

use crate::stage::Stage;

/// Adds its two inputs.
#[derive(Debug, Clone, Default)]
pub struct Sum;

impl Sum {
    /// Creates a summing stage.
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Sum {
    fn input_count(&self) -> usize {
        2
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
        for ((out, &a), &b) in outputs[0].iter_mut().zip(inputs[0]).zip(inputs[1]) {
            *out = a + b;
        }
    }
}

/// Copies its input. Used as a re-bindable tap point.
#[derive(Debug, Clone, Default)]
pub struct Identity;

impl Identity {
    /// Creates an identity stage.
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Identity {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
        let out = &mut *outputs[0];
        out.copy_from_slice(&inputs[0][..out.len()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_adds() {
        let mut out = [0.0; 2];
        Sum.process_block(&[&[1.0, 2.0], &[0.5, -2.0]], &mut [&mut out]);
        assert_eq!(out, [1.5, 0.0]);
    }

    #[test]
    fn identity_copies() {
        let mut out = [0.0; 2];
        Identity.process_block(&[&[0.25, -0.75]], &mut [&mut out]);
        assert_eq!(out, [0.25, -0.75]);
    }
}
