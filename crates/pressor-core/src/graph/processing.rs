//! Signal graph: node arena, port binding, cycle detection and block execution.
//!
//! [`SignalGraph`] owns every node of an engine. Topology is expressed as
//! bindings: each input port of a node names the [`Source`] it reads from.
//! Rebinding a port is the only topology mutation; it overwrites a handle and
//! marks the evaluation order dirty. The next [`process`](SignalGraph::process)
//! call recomputes the order by a depth-first walk upstream from the graph
//! outputs into scratch storage reserved when nodes were added, so the audio
//! thread never allocates.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::stage::{MAX_PORTS, Stage};

use super::buffer::OutputBuffers;
use super::node::{GraphStage, NodeData, NodeId, NodeKind, Source};

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    /// The specified node was not found in the graph.
    NodeNotFound(NodeId),
    /// The node has no input port with this index.
    PortOutOfRange {
        /// Node being bound.
        node: NodeId,
        /// Offending port.
        port: usize,
    },
    /// The upstream node has no output with this index.
    OutputOutOfRange {
        /// Upstream node.
        node: NodeId,
        /// Offending output.
        output: usize,
    },
    /// The graph has no external input channel with this index.
    ExternalOutOfRange(usize),
    /// The graph has no output with this index.
    GraphOutputOutOfRange(usize),
    /// `add_node` received the wrong number of port bindings.
    PortCount {
        /// Ports the stage has.
        expected: usize,
        /// Bindings supplied.
        found: usize,
    },
    /// The binding would make a node depend on its own output.
    CycleDetected,
    /// A block exceeded the preallocated buffer length.
    BlockTooLarge {
        /// Frames requested.
        frames: usize,
        /// Maximum block length.
        max: usize,
    },
    /// Wrong number of input or output channels passed to `process`.
    ChannelCount {
        /// Channels the graph was built with.
        expected: usize,
        /// Channels supplied.
        found: usize,
    },
    /// Channel slices of one block differ in length.
    BlockLength {
        /// Length of the first input channel.
        expected: usize,
        /// Length of the mismatching slice.
        found: usize,
    },
}

#[cfg(feature = "std")]
impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node {id} not found"),
            Self::PortOutOfRange { node, port } => write!(f, "{node} has no input port {port}"),
            Self::OutputOutOfRange { node, output } => write!(f, "{node} has no output {output}"),
            Self::ExternalOutOfRange(ch) => write!(f, "external input {ch} does not exist"),
            Self::GraphOutputOutOfRange(ch) => write!(f, "graph output {ch} does not exist"),
            Self::PortCount { expected, found } => {
                write!(f, "expected {expected} port bindings, found {found}")
            }
            Self::CycleDetected => write!(f, "binding would create a cycle"),
            Self::BlockTooLarge { frames, max } => {
                write!(f, "block of {frames} frames exceeds maximum of {max}")
            }
            Self::ChannelCount { expected, found } => {
                write!(f, "expected {expected} channels, found {found}")
            }
            Self::BlockLength { expected, found } => {
                write!(f, "channel length {found} does not match block length {expected}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GraphError {}

/// Input and output sample rate of the graph. Always equal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingContext {
    /// Rate of the external inputs.
    pub input_rate: f64,
    /// Rate of the graph outputs.
    pub output_rate: f64,
}

impl SamplingContext {
    /// Context with equal input and output rate.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            input_rate: sample_rate,
            output_rate: sample_rate,
        }
    }
}

/// DFS mark for order computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Open,
    Done,
}

/// Pull-evaluated graph of compressor stages.
///
/// # Usage
///
/// 1. Create a graph with [`new()`](Self::new)
/// 2. Add nodes with [`add_node()`](Self::add_node), binding every port
/// 3. Bind graph outputs with [`bind_output()`](Self::bind_output)
/// 4. Call [`process()`](Self::process) once per block
///
/// ```rust
/// use pressor_core::graph::{SignalGraph, Source};
/// use pressor_core::stages::Volume;
///
/// let mut graph = SignalGraph::new(1, 1, 64, 48000.0);
/// let mut volume = Volume::new();
/// volume.set_volume_db(20.0);
/// let node = graph.add_node(volume, &[Source::External(0)]).unwrap();
/// graph.bind_output(0, Source::node(node)).unwrap();
///
/// let input = [0.1_f64; 64];
/// let mut output = [0.0_f64; 64];
/// graph.process(&[&input], &mut [&mut output]).unwrap();
/// assert!((output[0] - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct SignalGraph {
    nodes: Vec<NodeData>,
    buffers: Vec<OutputBuffers>,
    outputs: Vec<Source>,
    input_channels: usize,
    max_block_size: usize,
    context: SamplingContext,
    order: Vec<NodeId>,
    marks: Vec<Mark>,
    stack: Vec<(NodeId, usize)>,
    dirty: bool,
}

impl SignalGraph {
    /// Creates an empty graph.
    ///
    /// Graph output `j` starts bound to external input `j % input_channels`,
    /// so an empty graph is a pass-through. `input_channels` is at least 1.
    pub fn new(
        input_channels: usize,
        output_channels: usize,
        max_block_size: usize,
        sample_rate: f64,
    ) -> Self {
        let input_channels = input_channels.max(1);
        let outputs = (0..output_channels)
            .map(|j| Source::External(j % input_channels))
            .collect();
        Self {
            nodes: Vec::new(),
            buffers: Vec::new(),
            outputs,
            input_channels,
            max_block_size,
            context: SamplingContext::new(sample_rate),
            order: Vec::new(),
            marks: Vec::new(),
            stack: Vec::new(),
            dirty: true,
        }
    }

    /// Adds a node and binds all of its input ports.
    ///
    /// `sources.len()` must equal the stage's input count. The stage is
    /// brought to the graph's sample rate.
    pub fn add_node(
        &mut self,
        kind: impl Into<NodeKind>,
        sources: &[Source],
    ) -> Result<NodeId, GraphError> {
        let mut kind = kind.into();
        let expected = kind.input_count();
        if sources.len() != expected {
            return Err(GraphError::PortCount {
                expected,
                found: sources.len(),
            });
        }
        for &source in sources {
            self.validate_source(source)?;
        }

        let id = NodeId(self.nodes.len() as u32);
        kind.set_sample_rate(self.context.input_rate);
        self.buffers
            .push(OutputBuffers::new(kind.output_count(), self.max_block_size));

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: {} node {id}", kind.name());

        self.nodes.push(NodeData::new(kind, sources));
        let count = self.nodes.len();
        self.order.reserve(count.saturating_sub(self.order.len()));
        self.stack.reserve(count.saturating_sub(self.stack.len()));
        self.marks.resize(count, Mark::Unvisited);
        self.dirty = true;
        Ok(id)
    }

    /// Rebinds input `port` of `node` to `source`.
    ///
    /// Rejects the binding when `source` is downstream of `node`. Binding an
    /// external input never allocates.
    pub fn bind(&mut self, node: NodeId, port: usize, source: Source) -> Result<(), GraphError> {
        let data = self.node(node)?;
        if port >= data.kind.input_count() {
            return Err(GraphError::PortOutOfRange { node, port });
        }
        if data.inputs[port] == source {
            return Ok(());
        }
        self.validate_source(source)?;
        if let Some(upstream) = source.upstream()
            && self.depends_on(upstream, node)
        {
            return Err(GraphError::CycleDetected);
        }

        #[cfg(feature = "tracing")]
        tracing::trace!("graph_bind: {node} port {port} <- {source:?}");

        self.nodes[node.slot()].inputs[port] = source;
        self.dirty = true;
        Ok(())
    }

    /// Binds graph output `index` to `source`.
    pub fn bind_output(&mut self, index: usize, source: Source) -> Result<(), GraphError> {
        if index >= self.outputs.len() {
            return Err(GraphError::GraphOutputOutOfRange(index));
        }
        if self.outputs[index] == source {
            return Ok(());
        }
        self.validate_source(source)?;
        self.outputs[index] = source;
        self.dirty = true;
        Ok(())
    }

    /// Current binding of input `port` of `node`.
    pub fn binding(&self, node: NodeId, port: usize) -> Option<Source> {
        self.nodes
            .get(node.slot())
            .and_then(|data| data.bound_inputs().get(port).copied())
    }

    /// Current binding of graph output `index`.
    pub fn output_binding(&self, index: usize) -> Option<Source> {
        self.outputs.get(index).copied()
    }

    /// Borrows the stage of `node` with its concrete type.
    pub fn stage<T: GraphStage>(&self, node: NodeId) -> Option<&T> {
        self.nodes
            .get(node.slot())
            .and_then(|data| T::from_kind(&data.kind))
    }

    /// Mutably borrows the stage of `node` with its concrete type.
    pub fn stage_mut<T: GraphStage>(&mut self, node: NodeId) -> Option<&mut T> {
        self.nodes
            .get_mut(node.slot())
            .and_then(|data| T::from_kind_mut(&mut data.kind))
    }

    /// The wrapped stage of `node`.
    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node.slot()).map(|data| &data.kind)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of external input channels.
    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    /// Number of graph outputs.
    pub fn output_channels(&self) -> usize {
        self.outputs.len()
    }

    /// Maximum frames per [`process`](Self::process) call.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Current sample rate.
    pub fn sample_rate(&self) -> f64 {
        self.context.input_rate
    }

    /// Current sampling context.
    pub fn sampling_context(&self) -> SamplingContext {
        self.context
    }

    /// Sets the sample rate and recomputes every node's coefficients.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_rate: {} -> {sample_rate} Hz",
            self.context.input_rate
        );
        self.context = SamplingContext::new(sample_rate);
        for data in &mut self.nodes {
            data.kind.set_sample_rate(sample_rate);
        }
    }

    /// Clears every node's recursive memory and output buffers.
    pub fn reset(&mut self) {
        for data in &mut self.nodes {
            data.kind.reset();
        }
        for buffers in &mut self.buffers {
            buffers.clear();
        }
    }

    /// Nodes in the order the next block will evaluate them.
    ///
    /// Only nodes reachable from a graph output are listed; every node
    /// appears after all of its upstream nodes.
    pub fn evaluation_order(&mut self) -> &[NodeId] {
        self.update_order();
        &self.order
    }

    /// Renders one block.
    ///
    /// `inputs` holds one slice per external channel and `outputs` one slice
    /// per graph output, all of the same length, at most
    /// [`max_block_size`](Self::max_block_size) frames.
    pub fn process(
        &mut self,
        inputs: &[&[f64]],
        outputs: &mut [&mut [f64]],
    ) -> Result<(), GraphError> {
        let frames = self.check_block(inputs, outputs)?;
        if frames == 0 {
            return Ok(());
        }
        self.update_order();

        for step in 0..self.order.len() {
            let slot = self.order[step].slot();
            let mut own = core::mem::take(&mut self.buffers[slot]);
            {
                let data = &mut self.nodes[slot];
                let empty: &[f64] = &[];
                let mut ins = [empty; MAX_PORTS];
                for (input, &source) in ins.iter_mut().zip(data.bound_inputs()) {
                    *input = read_source(&self.buffers, inputs, source, frames);
                }
                let input_count = data.kind.input_count();
                let output_count = data.kind.output_count();
                let mut outs = own.split_mut(frames);
                data.kind
                    .process_block(&ins[..input_count], &mut outs[..output_count]);
            }
            self.buffers[slot] = own;
        }

        for (out, &source) in outputs.iter_mut().zip(&self.outputs) {
            out.copy_from_slice(read_source(&self.buffers, inputs, source, frames));
        }
        Ok(())
    }

    fn check_block(&self, inputs: &[&[f64]], outputs: &[&mut [f64]]) -> Result<usize, GraphError> {
        if inputs.len() != self.input_channels {
            return Err(GraphError::ChannelCount {
                expected: self.input_channels,
                found: inputs.len(),
            });
        }
        if outputs.len() != self.outputs.len() {
            return Err(GraphError::ChannelCount {
                expected: self.outputs.len(),
                found: outputs.len(),
            });
        }
        let frames = inputs[0].len();
        let lengths = inputs.iter().map(|c| c.len()).chain(outputs.iter().map(|c| c.len()));
        for found in lengths {
            if found != frames {
                return Err(GraphError::BlockLength {
                    expected: frames,
                    found,
                });
            }
        }
        if frames > self.max_block_size {
            return Err(GraphError::BlockTooLarge {
                frames,
                max: self.max_block_size,
            });
        }
        Ok(frames)
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, GraphError> {
        self.nodes.get(id.slot()).ok_or(GraphError::NodeNotFound(id))
    }

    fn validate_source(&self, source: Source) -> Result<(), GraphError> {
        match source {
            Source::External(ch) if ch >= self.input_channels => {
                Err(GraphError::ExternalOutOfRange(ch))
            }
            Source::External(_) => Ok(()),
            Source::Node { node, output } => {
                if output >= self.node(node)?.kind.output_count() {
                    Err(GraphError::OutputOutOfRange { node, output })
                } else {
                    Ok(())
                }
            }
        }
    }

    /// DFS upstream from `from`: does it read (transitively) from `target`?
    ///
    /// Walks the same reserved scratch as the scheduler, so rebinding never
    /// allocates.
    fn depends_on(&mut self, from: NodeId, target: NodeId) -> bool {
        self.stack.clear();
        self.marks.fill(Mark::Unvisited);
        self.marks[from.slot()] = Mark::Open;
        self.stack.push((from, 0));

        while let Some(top) = self.stack.last_mut() {
            let (id, port) = *top;
            if id == target {
                self.stack.clear();
                return true;
            }
            let data = &self.nodes[id.slot()];
            if port < data.kind.input_count() {
                top.1 += 1;
                if let Some(upstream) = data.inputs[port].upstream()
                    && self.marks[upstream.slot()] == Mark::Unvisited
                {
                    self.marks[upstream.slot()] = Mark::Open;
                    self.stack.push((upstream, 0));
                }
            } else {
                self.stack.pop();
                self.marks[id.slot()] = Mark::Done;
            }
        }
        false
    }

    /// Post-order DFS from the graph outputs into the reserved scratch.
    fn update_order(&mut self) {
        if !self.dirty {
            return;
        }
        self.order.clear();
        self.stack.clear();
        self.marks.fill(Mark::Unvisited);

        for root in self.outputs.iter().filter_map(|source| source.upstream()) {
            if self.marks[root.slot()] != Mark::Unvisited {
                continue;
            }
            self.marks[root.slot()] = Mark::Open;
            self.stack.push((root, 0));

            while let Some(top) = self.stack.last_mut() {
                let (id, port) = *top;
                let data = &self.nodes[id.slot()];
                if port < data.kind.input_count() {
                    top.1 += 1;
                    if let Some(upstream) = data.inputs[port].upstream()
                        && self.marks[upstream.slot()] == Mark::Unvisited
                    {
                        self.marks[upstream.slot()] = Mark::Open;
                        self.stack.push((upstream, 0));
                    }
                } else {
                    self.stack.pop();
                    self.marks[id.slot()] = Mark::Done;
                    self.order.push(id);
                }
            }
        }
        self.dirty = false;

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_order: {} of {} nodes active", self.order.len(), self.nodes.len());
    }
}

#[inline]
fn read_source<'a>(
    buffers: &'a [OutputBuffers],
    inputs: &[&'a [f64]],
    source: Source,
    frames: usize,
) -> &'a [f64] {
    match source {
        Source::External(ch) => &inputs[ch][..frames],
        Source::Node { node, output } => buffers[node.slot()].channel(output, frames),
    }
}
