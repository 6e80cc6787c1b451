//! Port bindings of the stereo engine as a function of its four switches.
//!
//! Every rule is re-derived from scratch on each switch change, so the
//! resulting topology depends only on the current [`Routing`] and never on
//! the order in which switches were flipped.
//!
//! | port                         | bound to                                           |
//! |------------------------------|----------------------------------------------------|
//! | power n, applier n dry       | mid_side ? encoder out n : external n              |
//! | gain computer 1              | link ? sum(power 1, power 2) : power 1             |
//! | applier 2 gain               | link ? smoother 1 : smoother 2                     |
//! | decoder in n                 | active n ? makeup n : encoder out n                |
//! | dry/wet n processed          | mid_side ? decoder out n : (active n ? makeup n : external n) |
//! | dry/wet n dry                | external n                                         |

use pressor_core::{GraphError, NodeId, SignalGraph, Source};

use crate::params::Channel;

/// Node handles of the stereo graph.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StereoNodes {
    pub encoder: NodeId,
    pub power: [NodeId; 2],
    pub sum: NodeId,
    pub gain: [NodeId; 2],
    pub smoother: [NodeId; 2],
    pub applier: [NodeId; 2],
    pub makeup: [NodeId; 2],
    pub decoder: NodeId,
    pub drywet: [NodeId; 2],
}

/// Switch state of the stereo engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Routing {
    /// Process mid/side instead of left/right.
    pub mid_side: bool,
    /// Drive channel 2 with channel 1's detector over the summed power.
    pub link: bool,
    /// Compress channel 1.
    pub ch1_active: bool,
    /// Compress channel 2.
    pub ch2_active: bool,
}

impl Default for Routing {
    fn default() -> Self {
        Self {
            mid_side: false,
            link: false,
            ch1_active: true,
            ch2_active: true,
        }
    }
}

impl Routing {
    /// Whether `channel` is compressed.
    pub fn is_active(&self, channel: Channel) -> bool {
        self.active(channel.index())
    }

    /// Signal the detector and the gain applier of channel `n` read.
    pub(crate) fn detect_source(&self, nodes: &StereoNodes, n: usize) -> Source {
        if self.mid_side {
            Source::output(nodes.encoder, n)
        } else {
            Source::External(n)
        }
    }

    /// Processed input of dry/wet mixer `n`.
    pub(crate) fn processed_source(&self, nodes: &StereoNodes, n: usize) -> Source {
        if self.mid_side {
            Source::output(nodes.decoder, n)
        } else if self.active(n) {
            Source::node(nodes.makeup[n])
        } else {
            Source::External(n)
        }
    }

    fn active(&self, n: usize) -> bool {
        if n == 0 { self.ch1_active } else { self.ch2_active }
    }

    /// Rebinds every switch-dependent port of `graph`.
    pub(crate) fn apply(&self, graph: &mut SignalGraph, nodes: &StereoNodes) -> Result<(), GraphError> {
        for n in 0..2 {
            let detect = self.detect_source(nodes, n);
            graph.bind(nodes.power[n], 0, detect)?;
            graph.bind(nodes.applier[n], 1, detect)?;
        }

        let gain1_input = if self.link {
            Source::node(nodes.sum)
        } else {
            Source::node(nodes.power[0])
        };
        graph.bind(nodes.gain[0], 0, gain1_input)?;

        let applier2_gain = if self.link {
            Source::node(nodes.smoother[0])
        } else {
            Source::node(nodes.smoother[1])
        };
        graph.bind(nodes.applier[1], 0, applier2_gain)?;

        for n in 0..2 {
            let decoder_input = if self.active(n) {
                Source::node(nodes.makeup[n])
            } else {
                Source::output(nodes.encoder, n)
            };
            graph.bind(nodes.decoder, n, decoder_input)?;
            graph.bind(nodes.drywet[n], 0, self.processed_source(nodes, n))?;
            graph.bind(nodes.drywet[n], 1, Source::External(n))?;
        }

        tracing::debug!(
            "Routing: mid_side={} link={} ch1={} ch2={}",
            self.mid_side,
            self.link,
            self.ch1_active,
            self.ch2_active
        );
        Ok(())
    }
}
