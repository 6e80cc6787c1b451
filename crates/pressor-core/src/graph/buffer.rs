//! Per-node output storage.
//!
//! Each node owns one [`OutputBuffers`] with a channel per stage output,
//! sized to the graph's maximum block length at construction. The audio
//! thread only borrows prefixes of these buffers; it never resizes them.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::stage::MAX_PORTS;

/// Output channels of one node.
///
/// `Default` yields empty channels without allocating, which lets the graph
/// move a node's buffers out with [`core::mem::take`] while the node runs.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffers {
    channels: [Vec<f64>; MAX_PORTS],
}

impl OutputBuffers {
    /// Allocates `count` zeroed channels of `block_size` samples.
    pub fn new(count: usize, block_size: usize) -> Self {
        let mut buffers = Self::default();
        for channel in buffers.channels.iter_mut().take(count) {
            *channel = vec![0.0; block_size];
        }
        buffers
    }

    /// First `frames` samples of output `index` (empty if the output does not exist).
    pub fn channel(&self, index: usize, frames: usize) -> &[f64] {
        match self.channels.get(index) {
            Some(channel) => &channel[..frames.min(channel.len())],
            None => &[],
        }
    }

    /// Mutable prefixes of every channel, ready to pass to a stage.
    pub fn split_mut(&mut self, frames: usize) -> [&mut [f64]; MAX_PORTS] {
        let [first, second] = &mut self.channels;
        let first_len = frames.min(first.len());
        let second_len = frames.min(second.len());
        [&mut first[..first_len], &mut second[..second_len]]
    }

    /// Fills every channel with zeros.
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Allocated samples per channel (0 when the node has been moved out).
    pub fn capacity(&self) -> usize {
        self.channels[0].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let buffers = OutputBuffers::default();
        assert_eq!(buffers.capacity(), 0);
        assert!(buffers.channel(0, 16).is_empty());
    }

    #[test]
    fn split_respects_allocated_channels() {
        let mut buffers = OutputBuffers::new(1, 8);
        let [first, second] = buffers.split_mut(4);
        assert_eq!(first.len(), 4);
        assert!(second.is_empty());
        first.fill(1.0);
        assert_eq!(buffers.channel(0, 8), &[1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        buffers.clear();
        assert!(buffers.channel(0, 8).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn out_of_range_channel_is_empty() {
        let buffers = OutputBuffers::new(2, 4);
        assert!(buffers.channel(5, 4).is_empty());
        assert_eq!(buffers.channel(1, 2).len(), 2);
    }
}
