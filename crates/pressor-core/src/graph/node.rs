//! Node identifiers, port bindings and the closed set of node kinds.
//!
//! Every node of a [`SignalGraph`](super::SignalGraph) wraps one stage from
//! [`crate::stages`] in a [`NodeKind`] variant. Each input port of a node is
//! bound to exactly one [`Source`]: an output of another node or one of the
//! graph's external input channels.

use crate::stage::{MAX_PORTS, Stage};
use crate::stages::{
    AttackRelease, BandFilter, DryWet, GainApplier, GainComputer, Identity, MidSide,
    PowerEstimator, Sum, Volume,
};

/// Unique identifier for a node in the signal graph.
///
/// Node IDs are assigned sequentially and never reused within a graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Where an input port (or a graph output) takes its samples from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    /// Output `output` of node `node`.
    Node {
        /// Upstream node.
        node: NodeId,
        /// Output index on the upstream node.
        output: usize,
    },
    /// External input channel of the graph.
    External(usize),
}

impl Source {
    /// First output of `node`.
    #[inline]
    pub fn node(node: NodeId) -> Self {
        Self::Node { node, output: 0 }
    }

    /// Output `output` of `node`.
    #[inline]
    pub fn output(node: NodeId, output: usize) -> Self {
        Self::Node { node, output }
    }

    /// Upstream node, if the source is not external.
    #[inline]
    pub fn upstream(self) -> Option<NodeId> {
        match self {
            Self::Node { node, .. } => Some(node),
            Self::External(_) => None,
        }
    }
}

/// Stage types that can live in a [`NodeKind`].
///
/// Implemented for every stage in [`crate::stages`]; lets callers reach a
/// node's stage with its concrete type through
/// [`SignalGraph::stage_mut`](super::SignalGraph::stage_mut).
pub trait GraphStage: Stage + Sized {
    /// Borrows the stage if `kind` holds this type.
    fn from_kind(kind: &NodeKind) -> Option<&Self>;
    /// Mutably borrows the stage if `kind` holds this type.
    fn from_kind_mut(kind: &mut NodeKind) -> Option<&mut Self>;
}

macro_rules! node_kinds {
    ($($variant:ident),* $(,)?) => {
        /// The stage wrapped by a graph node.
        #[derive(Debug, Clone)]
        pub enum NodeKind {
            $(
                #[doc = concat!("A [`", stringify!($variant), "`] stage.")]
                $variant($variant),
            )*
        }

        impl NodeKind {
            /// Short name of the wrapped stage, for logs.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => stringify!($variant),)*
                }
            }
        }

        impl Stage for NodeKind {
            fn input_count(&self) -> usize {
                match self {
                    $(Self::$variant(stage) => stage.input_count(),)*
                }
            }

            fn output_count(&self) -> usize {
                match self {
                    $(Self::$variant(stage) => stage.output_count(),)*
                }
            }

            fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) {
                match self {
                    $(Self::$variant(stage) => stage.process_block(inputs, outputs),)*
                }
            }

            fn set_sample_rate(&mut self, sample_rate: f64) {
                match self {
                    $(Self::$variant(stage) => stage.set_sample_rate(sample_rate),)*
                }
            }

            fn reset(&mut self) {
                match self {
                    $(Self::$variant(stage) => stage.reset(),)*
                }
            }
        }

        $(
            impl From<$variant> for NodeKind {
                fn from(stage: $variant) -> Self {
                    Self::$variant(stage)
                }
            }

            impl GraphStage for $variant {
                fn from_kind(kind: &NodeKind) -> Option<&Self> {
                    match kind {
                        NodeKind::$variant(stage) => Some(stage),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }

                fn from_kind_mut(kind: &mut NodeKind) -> Option<&mut Self> {
                    match kind {
                        NodeKind::$variant(stage) => Some(stage),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            }
        )*
    };
}

node_kinds!(
    BandFilter,
    PowerEstimator,
    AttackRelease,
    GainComputer,
    GainApplier,
    Volume,
    MidSide,
    DryWet,
    Sum,
    Identity,
);

/// Internal bookkeeping for a node in the graph.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    /// Port bindings; only the first `kind.input_count()` are meaningful.
    pub inputs: [Source; MAX_PORTS],
}

impl NodeData {
    pub fn new(kind: NodeKind, sources: &[Source]) -> Self {
        let mut inputs = [Source::External(0); MAX_PORTS];
        for (slot, source) in inputs.iter_mut().zip(sources) {
            *slot = *source;
        }
        Self { kind, inputs }
    }

    /// Bound sources of the node's active ports.
    pub fn bound_inputs(&self) -> &[Source] {
        &self.inputs[..self.kind.input_count()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_delegates_port_counts() {
        let kind = NodeKind::from(MidSide::new());
        assert_eq!(kind.input_count(), 2);
        assert_eq!(kind.output_count(), 2);
        assert_eq!(kind.name(), "MidSide");
        let kind = NodeKind::from(Volume::new());
        assert_eq!(kind.input_count(), 1);
    }

    #[test]
    fn typed_access_matches_variant() {
        let mut kind = NodeKind::from(Volume::new());
        assert!(Volume::from_kind(&kind).is_some());
        assert!(DryWet::from_kind(&kind).is_none());
        if let Some(volume) = Volume::from_kind_mut(&mut kind) {
            volume.set_volume_db(6.0);
        }
        assert_eq!(Volume::from_kind(&kind).map(Volume::volume_db), Some(6.0));
    }

    #[test]
    fn source_helpers() {
        let id = NodeId(3);
        assert_eq!(Source::node(id), Source::Node { node: id, output: 0 });
        assert_eq!(Source::output(id, 1).upstream(), Some(id));
        assert_eq!(Source::External(1).upstream(), None);
        assert_eq!(format!("{id}"), "NodeId(3)");
    }
}
