//! Engine handle shared between a control thread and an audio thread.
//!
//! [`SharedEngine`] wraps an engine in `Arc<parking_lot::Mutex<_>>`.
//! Rendering holds the lock for one whole block, parameter updates and
//! resets only for the update itself, so a block always sees either all or
//! none of an update. [`SharedEngine::try_process`] never waits: a busy
//! engine yields the dry input for that block.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{ChannelEngine, EngineError};

/// Cloneable, thread-safe handle to a [`ChannelEngine`].
///
/// ```rust
/// use pressor_engine::{SharedEngine, StereoEngine, StereoParam};
///
/// let engine = SharedEngine::new(StereoEngine::new(48000.0, 256).unwrap());
/// let control = engine.clone();
/// std::thread::spawn(move || control.set_parameter(StereoParam::Link.index(), 1.0))
///     .join()
///     .unwrap();
/// assert!(engine.with(|e| e.routing().link));
/// ```
pub struct SharedEngine<E> {
    inner: Arc<Mutex<E>>,
}

impl<E> Clone for SharedEngine<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: ChannelEngine> SharedEngine<E> {
    /// Wraps `engine`.
    pub fn new(engine: E) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Renders one block under the lock.
    pub fn process(&self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) -> Result<(), EngineError> {
        self.inner.lock().process(inputs, outputs)
    }

    /// Renders one block if the engine is free.
    ///
    /// When another thread holds the lock the block is passed through dry:
    /// output `j` copies input `j`, and outputs with no matching input are
    /// silenced. Returns `Ok(false)` in that case.
    pub fn try_process(
        &self,
        inputs: &[&[f64]],
        outputs: &mut [&mut [f64]],
    ) -> Result<bool, EngineError> {
        match self.inner.try_lock() {
            Some(mut engine) => engine.process(inputs, outputs).map(|()| true),
            None => {
                bypass(inputs, outputs);
                Ok(false)
            }
        }
    }

    /// Forwards a host control change.
    pub fn set_parameter(&self, index: usize, value: f64) {
        self.inner.lock().on_parameter_changed(index, value);
    }

    /// Current value of the parameter at `index`.
    pub fn parameter(&self, index: usize) -> f64 {
        self.inner.lock().get_param(index)
    }

    /// Applies a new sample rate.
    pub fn reset(&self, sample_rate: f64) -> Result<(), EngineError> {
        self.inner.lock().reset(sample_rate)
    }

    /// Runs `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

fn bypass(inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
    for (j, output) in outputs.iter_mut().enumerate() {
        let copied = inputs.get(j).map_or(0, |input| {
            let n = input.len().min(output.len());
            output[..n].copy_from_slice(&input[..n]);
            n
        });
        output[copied..].fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SideChainEngine, SideChainParam};

    #[test]
    fn clones_share_state() {
        let a = SharedEngine::new(SideChainEngine::new(48000.0, 64).unwrap());
        let b = a.clone();
        b.set_parameter(SideChainParam::Ratio.index(), 8.0);
        assert_eq!(a.parameter(SideChainParam::Ratio.index()), 8.0);
    }

    #[test]
    fn try_process_passes_input_through_while_locked() {
        let shared = SharedEngine::new(SideChainEngine::new(48000.0, 64).unwrap());
        let input = [0.5; 64];
        let key = [0.9; 64];
        let skipped = shared.with(|_| {
            let mut out = [7.0; 64];
            let result = shared.try_process(&[&input, &key], &mut [&mut out]);
            (result, out)
        });
        assert_eq!(skipped, (Ok(false), input));

        let mut out = [7.0; 64];
        assert_eq!(shared.try_process(&[&input, &key], &mut [&mut out]), Ok(true));
        assert!(out.iter().all(|&x| x < 0.5 + 1e-9));
    }

    #[test]
    fn bypass_silences_unmatched_outputs() {
        let left = [0.25; 8];
        let mut out_l = [7.0; 8];
        let mut out_r = [7.0; 8];
        bypass(&[&left[..6]], &mut [&mut out_l, &mut out_r]);
        assert_eq!(out_l, [0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.0, 0.0]);
        assert_eq!(out_r, [0.0; 8]);
    }

    #[test]
    fn concurrent_updates_and_processing() {
        let shared = SharedEngine::new(SideChainEngine::new(48000.0, 64).unwrap());
        let control = shared.clone();
        let handle = std::thread::spawn(move || {
            for i in 0..200 {
                control.set_parameter(SideChainParam::Threshold.index(), -f64::from(i % 40));
            }
        });
        let input = [0.25; 64];
        let mut out = [0.0; 64];
        for _ in 0..200 {
            shared.process(&[&input], &mut [&mut out]).unwrap();
            assert!(out.iter().all(|x| x.is_finite()));
        }
        handle.join().unwrap();
    }
}
