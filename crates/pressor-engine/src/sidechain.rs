//! Single-channel compressor keyed by an optional side-chain input.
//!
//! ```text
//! key ─► tap ─► band filter ─► power ─► gain computer ─► smoother ─┐
//!                                                                  ▼
//! main ────────────────────────────────────────────────────► applier ─► makeup ─► dry/wet ─► out
//!   └───────────────────────────────────────────────────────────────────────────────┘ (dry)
//! ```
//!
//! The tap is an identity node bound to the side-chain input while one is
//! connected and to the main input otherwise.

use pressor_core::stages::{
    AttackRelease, BandFilter, DryWet, GainApplier, GainComputer, Identity, PowerEstimator, Volume,
};
use pressor_core::{NodeId, ParamDescriptor, ParameterInfo, SignalGraph, Source, linear_to_db};

use crate::error::{EngineError, check_block_length, check_sample_rate};
use crate::params::{ParamStore, SideChainParam, knee_from_softness, sanitize};
use crate::{ChannelEngine, process_chunked};

/// Detector power time constant.
const POWER_TIME_CONSTANT_MS: f64 = 1.0;

const MAIN: usize = 0;
const KEY: usize = 1;

#[derive(Debug, Clone, Copy)]
struct Nodes {
    tap: NodeId,
    filter: NodeId,
    gain: NodeId,
    smoother: NodeId,
    makeup: NodeId,
    drywet: NodeId,
}

/// Side-chain compressor engine: inputs `[main]` or `[main, key]`, one output.
#[derive(Debug)]
pub struct SideChainEngine {
    graph: SignalGraph,
    nodes: Nodes,
    params: ParamStore<{ SideChainParam::COUNT }>,
    sample_rate: f64,
    sidechain_connected: bool,
}

impl SideChainEngine {
    /// Builds the engine with every parameter at its default.
    pub fn new(sample_rate: f64, max_block_size: usize) -> Result<Self, EngineError> {
        let sample_rate = check_sample_rate(sample_rate)?;
        if max_block_size == 0 {
            return Err(EngineError::InvalidBlockSize(max_block_size));
        }

        let mut graph = SignalGraph::new(2, 1, max_block_size, sample_rate);
        let tap = graph.add_node(Identity::new(), &[Source::External(KEY)])?;
        let filter = graph.add_node(BandFilter::new(sample_rate), &[Source::node(tap)])?;
        let power = graph.add_node(
            PowerEstimator::with_time_constant_ms(POWER_TIME_CONSTANT_MS, sample_rate),
            &[Source::node(filter)],
        )?;
        let gain = graph.add_node(GainComputer::new(), &[Source::node(power)])?;
        let smoother = graph.add_node(AttackRelease::new(sample_rate, 1.0), &[Source::node(gain)])?;
        let applier = graph.add_node(
            GainApplier::new(),
            &[Source::node(smoother), Source::External(MAIN)],
        )?;
        let makeup = graph.add_node(Volume::new(), &[Source::node(applier)])?;
        let drywet = graph.add_node(
            DryWet::new(),
            &[Source::node(makeup), Source::External(MAIN)],
        )?;
        graph.bind_output(0, Source::node(drywet))?;

        let mut engine = Self {
            graph,
            nodes: Nodes {
                tap,
                filter,
                gain,
                smoother,
                makeup,
                drywet,
            },
            params: ParamStore::from_defaults(|i| SideChainParam::from_index(i).map(SideChainParam::descriptor)),
            sample_rate,
            sidechain_connected: true,
        };
        for param in SideChainParam::ALL {
            engine.apply(param);
        }
        tracing::debug!("SideChainEngine: created at {sample_rate} Hz, max block {max_block_size}");
        Ok(engine)
    }

    /// Marks the side-chain input as connected or not.
    ///
    /// While disconnected, the main input drives detection even if a second
    /// input slice is passed to [`process`](ChannelEngine::process).
    pub fn set_sidechain_connected(&mut self, connected: bool) {
        self.sidechain_connected = connected;
    }

    /// Whether the side-chain input is marked connected.
    pub fn sidechain_connected(&self) -> bool {
        self.sidechain_connected
    }

    /// Current value of a parameter.
    pub fn parameter(&self, param: SideChainParam) -> f64 {
        self.params.get(param.index())
    }

    /// Gain currently applied by the smoother, in dB (0 or negative).
    pub fn gain_reduction_db(&self) -> f64 {
        self.graph
            .stage::<AttackRelease>(self.nodes.smoother)
            .map_or(0.0, |s| linear_to_db(s.last_output()))
    }

    /// The underlying signal graph.
    pub fn graph(&self) -> &SignalGraph {
        &self.graph
    }

    /// Pushes the stored value of `param` into its stage.
    fn apply(&mut self, param: SideChainParam) {
        let value = self.params.get(param.index());
        let nodes = self.nodes;
        match param {
            SideChainParam::LowCut | SideChainParam::HighCut => {
                let lf = self.params.get(SideChainParam::LowCut.index());
                let hf = self.params.get(SideChainParam::HighCut.index());
                if let Some(filter) = self.graph.stage_mut::<BandFilter>(nodes.filter)
                    && let Err(err) = filter.set_cut_frequencies(lf.min(hf), lf.max(hf))
                {
                    tracing::warn!("SideChainEngine: band filter rejected {lf}/{hf} Hz: {err}");
                }
            }
            // The Attack control sets the rising-gain time and Release the
            // falling-gain time.
            SideChainParam::Attack => {
                if let Some(s) = self.graph.stage_mut::<AttackRelease>(nodes.smoother) {
                    s.set_release_ms(value);
                }
            }
            SideChainParam::Release => {
                if let Some(s) = self.graph.stage_mut::<AttackRelease>(nodes.smoother) {
                    s.set_attack_ms(value);
                }
            }
            SideChainParam::Threshold => {
                if let Some(g) = self.graph.stage_mut::<GainComputer>(nodes.gain) {
                    g.set_threshold_db(value);
                }
            }
            SideChainParam::Ratio => {
                if let Some(g) = self.graph.stage_mut::<GainComputer>(nodes.gain) {
                    g.set_ratio(value);
                }
            }
            SideChainParam::Softness => {
                if let Some(g) = self.graph.stage_mut::<GainComputer>(nodes.gain) {
                    g.set_softness(knee_from_softness(value));
                }
            }
            SideChainParam::Makeup => {
                if let Some(v) = self.graph.stage_mut::<Volume>(nodes.makeup) {
                    v.set_volume_db(value);
                }
            }
            SideChainParam::DryWet => {
                if let Some(m) = self.graph.stage_mut::<DryWet>(nodes.drywet) {
                    m.set_wet(value);
                }
            }
        }
    }
}

impl ChannelEngine for SideChainEngine {
    fn input_channels(&self) -> usize {
        2
    }

    fn output_channels(&self) -> usize {
        1
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn reset(&mut self, sample_rate: f64) -> Result<(), EngineError> {
        let sample_rate = check_sample_rate(sample_rate)?;
        if sample_rate == self.sample_rate {
            tracing::trace!("SideChainEngine: reset at unchanged rate {sample_rate} Hz");
            return Ok(());
        }
        tracing::debug!("SideChainEngine: sample rate {} -> {sample_rate} Hz", self.sample_rate);
        self.sample_rate = sample_rate;
        self.graph.set_sample_rate(sample_rate);
        self.graph.reset();
        Ok(())
    }

    fn on_parameter_changed(&mut self, index: usize, value: f64) {
        let Some(param) = SideChainParam::from_index(index) else {
            tracing::trace!("SideChainEngine: ignoring unknown parameter {index}");
            return;
        };
        let Some(value) = sanitize(&param.descriptor(), value) else {
            tracing::warn!("SideChainEngine: ignoring non-finite value for {param:?}");
            return;
        };
        tracing::debug!("SideChainEngine: {param:?} = {value}");
        self.params.set(index, value);
        self.apply(param);
    }

    fn process(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) -> Result<(), EngineError> {
        if inputs.is_empty() || inputs.len() > 2 {
            return Err(EngineError::ChannelCount {
                expected: 2,
                found: inputs.len(),
            });
        }
        if outputs.len() != 1 {
            return Err(EngineError::ChannelCount {
                expected: 1,
                found: outputs.len(),
            });
        }
        let frames = check_block_length(inputs, outputs)?;

        let keyed = self.sidechain_connected && inputs.len() == 2;
        let key = if keyed { Source::External(KEY) } else { Source::External(MAIN) };
        self.graph.bind(self.nodes.tap, 0, key)?;

        let main = inputs[MAIN];
        let side = if keyed { inputs[KEY] } else { main };
        process_chunked(&mut self.graph, &[main, side], outputs, frames)?;
        Ok(())
    }
}

impl ParameterInfo for SideChainEngine {
    fn param_count(&self) -> usize {
        SideChainParam::COUNT
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        SideChainParam::from_index(index).map(SideChainParam::descriptor)
    }

    fn get_param(&self, index: usize) -> f64 {
        self.params.get(index)
    }

    fn set_param(&mut self, index: usize, value: f64) {
        self.on_parameter_changed(index, value);
    }
}
