//! Two-channel compressor with optional mid/side processing and linking.
//!
//! Each channel runs power estimator, gain computer, smoother, gain applier
//! and makeup. A mid/side matrix sits in front of the detectors and another
//! one behind the makeup stages; both are only in the signal path while
//! mid/side mode is on. The switch-dependent bindings live in
//! [`Routing`](crate::Routing).

use pressor_core::stages::{
    AttackRelease, DryWet, GainApplier, GainComputer, MidSide, PowerEstimator, Sum, Volume,
};
use pressor_core::{ParamDescriptor, ParameterInfo, SignalGraph, Source, linear_to_db};

use crate::error::{EngineError, check_block_length, check_sample_rate};
use crate::params::{Channel, ChannelControl, ParamStore, StereoParam, knee_from_softness, sanitize};
use crate::routing::{Routing, StereoNodes};
use crate::{ChannelEngine, process_chunked};

/// Stereo compressor engine: two inputs, two outputs.
#[derive(Debug)]
pub struct StereoEngine {
    graph: SignalGraph,
    nodes: StereoNodes,
    params: ParamStore<{ StereoParam::COUNT }>,
    routing: Routing,
    sample_rate: f64,
}

impl StereoEngine {
    /// Builds the engine with every parameter at its default.
    pub fn new(sample_rate: f64, max_block_size: usize) -> Result<Self, EngineError> {
        let sample_rate = check_sample_rate(sample_rate)?;
        if max_block_size == 0 {
            return Err(EngineError::InvalidBlockSize(max_block_size));
        }

        let mut graph = SignalGraph::new(2, 2, max_block_size, sample_rate);
        let ext = [Source::External(0), Source::External(1)];

        let encoder = graph.add_node(MidSide::new(), &ext)?;
        let power = [
            graph.add_node(PowerEstimator::with_memory(0.0), &[ext[0]])?,
            graph.add_node(PowerEstimator::with_memory(0.0), &[ext[1]])?,
        ];
        let sum = graph.add_node(Sum::new(), &[Source::node(power[0]), Source::node(power[1])])?;
        let gain = [
            graph.add_node(GainComputer::new(), &[Source::node(power[0])])?,
            graph.add_node(GainComputer::new(), &[Source::node(power[1])])?,
        ];
        let smoother = [
            graph.add_node(AttackRelease::new(sample_rate, 1.0), &[Source::node(gain[0])])?,
            graph.add_node(AttackRelease::new(sample_rate, 1.0), &[Source::node(gain[1])])?,
        ];
        let applier = [
            graph.add_node(GainApplier::new(), &[Source::node(smoother[0]), ext[0]])?,
            graph.add_node(GainApplier::new(), &[Source::node(smoother[1]), ext[1]])?,
        ];
        let makeup = [
            graph.add_node(Volume::new(), &[Source::node(applier[0])])?,
            graph.add_node(Volume::new(), &[Source::node(applier[1])])?,
        ];
        let decoder = graph.add_node(
            MidSide::new(),
            &[Source::node(makeup[0]), Source::node(makeup[1])],
        )?;
        let drywet = [
            graph.add_node(DryWet::new(), &[Source::node(makeup[0]), ext[0]])?,
            graph.add_node(DryWet::new(), &[Source::node(makeup[1]), ext[1]])?,
        ];
        graph.bind_output(0, Source::node(drywet[0]))?;
        graph.bind_output(1, Source::node(drywet[1]))?;

        let nodes = StereoNodes {
            encoder,
            power,
            sum,
            gain,
            smoother,
            applier,
            makeup,
            decoder,
            drywet,
        };
        let mut engine = Self {
            graph,
            nodes,
            params: ParamStore::from_defaults(|i| StereoParam::from_index(i).map(StereoParam::descriptor)),
            routing: Routing::default(),
            sample_rate,
        };
        engine.update_routing()?;
        for index in 0..StereoParam::COUNT {
            if let Some(param) = StereoParam::from_index(index) {
                engine.apply(param);
            }
        }
        tracing::debug!("StereoEngine: created at {sample_rate} Hz, max block {max_block_size}");
        Ok(engine)
    }

    /// Current switch state.
    pub fn routing(&self) -> Routing {
        self.routing
    }

    /// Whether channel 2's detector controls have any effect.
    ///
    /// False while linked: channel 2 then follows channel 1's detector and
    /// makeup gain.
    pub fn channel2_controls_enabled(&self) -> bool {
        !self.routing.link
    }

    /// Current value of a parameter.
    pub fn parameter(&self, param: StereoParam) -> f64 {
        self.params.get(param.index())
    }

    /// Gain currently applied to `channel` by its smoother, in dB (0 or negative).
    pub fn gain_reduction_db(&self, channel: Channel) -> f64 {
        let smoother = match channel {
            Channel::Two if !self.routing.link => self.nodes.smoother[1],
            _ => self.nodes.smoother[0],
        };
        self.graph
            .stage::<AttackRelease>(smoother)
            .map_or(0.0, |s| linear_to_db(s.last_output()))
    }

    /// The underlying signal graph.
    pub fn graph(&self) -> &SignalGraph {
        &self.graph
    }

    fn update_routing(&mut self) -> Result<(), EngineError> {
        self.routing = Routing {
            mid_side: self.params.flag(StereoParam::MidSide.index()),
            link: self.params.flag(StereoParam::Link.index()),
            ch1_active: self.params.flag(StereoParam::Active(Channel::One).index()),
            ch2_active: self.params.flag(StereoParam::Active(Channel::Two).index()),
        };
        self.routing.apply(&mut self.graph, &self.nodes)?;
        Ok(())
    }

    /// Makeup gain channel 2's stage should use.
    fn makeup2_db(&self) -> f64 {
        let source = if self.routing.link { Channel::One } else { Channel::Two };
        self.params
            .get(StereoParam::Channel(source, ChannelControl::Makeup).index())
    }

    /// Pushes the stored value of `param` into its stage.
    fn apply(&mut self, param: StereoParam) {
        let value = self.params.get(param.index());
        let nodes = self.nodes;
        match param {
            StereoParam::MidSide | StereoParam::Link | StereoParam::Active(_) => {
                if let Err(err) = self.update_routing() {
                    tracing::warn!("StereoEngine: rebinding failed: {err}");
                }
                if param == StereoParam::Link {
                    self.set_makeup(1, self.makeup2_db());
                }
            }
            StereoParam::Channel(channel, control) => {
                let n = channel.index();
                match control {
                    // The Attack control sets the rising-gain time and
                    // Release the falling-gain time.
                    ChannelControl::Attack => {
                        if let Some(s) = self.graph.stage_mut::<AttackRelease>(nodes.smoother[n]) {
                            s.set_release_ms(value);
                        }
                    }
                    ChannelControl::Release => {
                        if let Some(s) = self.graph.stage_mut::<AttackRelease>(nodes.smoother[n]) {
                            s.set_attack_ms(value);
                        }
                    }
                    ChannelControl::Threshold => {
                        if let Some(g) = self.graph.stage_mut::<GainComputer>(nodes.gain[n]) {
                            g.set_threshold_db(value);
                        }
                    }
                    ChannelControl::Ratio => {
                        if let Some(g) = self.graph.stage_mut::<GainComputer>(nodes.gain[n]) {
                            g.set_ratio(value);
                        }
                    }
                    ChannelControl::Softness => {
                        if let Some(g) = self.graph.stage_mut::<GainComputer>(nodes.gain[n]) {
                            g.set_softness(knee_from_softness(value));
                        }
                    }
                    ChannelControl::Makeup => match channel {
                        Channel::One => {
                            self.set_makeup(0, value);
                            if self.routing.link {
                                self.set_makeup(1, value);
                            }
                        }
                        Channel::Two => self.set_makeup(1, self.makeup2_db()),
                    },
                }
            }
            StereoParam::DryWet => {
                for node in nodes.drywet {
                    if let Some(m) = self.graph.stage_mut::<DryWet>(node) {
                        m.set_wet(value);
                    }
                }
            }
        }
    }

    fn set_makeup(&mut self, n: usize, db: f64) {
        if let Some(v) = self.graph.stage_mut::<Volume>(self.nodes.makeup[n]) {
            v.set_volume_db(db);
        }
    }
}

impl ChannelEngine for StereoEngine {
    fn input_channels(&self) -> usize {
        2
    }

    fn output_channels(&self) -> usize {
        2
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn reset(&mut self, sample_rate: f64) -> Result<(), EngineError> {
        let sample_rate = check_sample_rate(sample_rate)?;
        if sample_rate == self.sample_rate {
            tracing::trace!("StereoEngine: reset at unchanged rate {sample_rate} Hz");
            return Ok(());
        }
        tracing::debug!("StereoEngine: sample rate {} -> {sample_rate} Hz", self.sample_rate);
        self.sample_rate = sample_rate;
        self.graph.set_sample_rate(sample_rate);
        self.graph.reset();
        Ok(())
    }

    fn on_parameter_changed(&mut self, index: usize, value: f64) {
        let Some(param) = StereoParam::from_index(index) else {
            tracing::trace!("StereoEngine: ignoring unknown parameter {index}");
            return;
        };
        let Some(value) = sanitize(&param.descriptor(), value) else {
            tracing::warn!("StereoEngine: ignoring non-finite value for {param:?}");
            return;
        };
        tracing::debug!("StereoEngine: {param:?} = {value}");
        self.params.set(index, value);
        self.apply(param);
    }

    fn process(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]]) -> Result<(), EngineError> {
        for found in [inputs.len(), outputs.len()] {
            if found != 2 {
                return Err(EngineError::ChannelCount { expected: 2, found });
            }
        }
        let frames = check_block_length(inputs, outputs)?;
        process_chunked(&mut self.graph, inputs, outputs, frames)?;
        Ok(())
    }
}

impl ParameterInfo for StereoEngine {
    fn param_count(&self) -> usize {
        StereoParam::COUNT
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        StereoParam::from_index(index).map(StereoParam::descriptor)
    }

    fn get_param(&self, index: usize) -> f64 {
        self.params.get(index)
    }

    fn set_param(&mut self, index: usize, value: f64) {
        self.on_parameter_changed(index, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> StereoEngine {
        StereoEngine::new(48000.0, 128).unwrap()
    }

    fn set(engine: &mut StereoEngine, param: StereoParam, value: f64) {
        engine.on_parameter_changed(param.index(), value);
    }

    #[test]
    fn default_routing_is_dual_mono() {
        let engine = engine();
        let g = engine.graph();
        let n = engine.nodes;
        assert_eq!(g.binding(n.power[0], 0), Some(Source::External(0)));
        assert_eq!(g.binding(n.power[1], 0), Some(Source::External(1)));
        assert_eq!(g.binding(n.gain[0], 0), Some(Source::node(n.power[0])));
        assert_eq!(g.binding(n.applier[1], 0), Some(Source::node(n.smoother[1])));
        assert_eq!(g.binding(n.drywet[0], 0), Some(Source::node(n.makeup[0])));
        assert_eq!(g.binding(n.drywet[1], 1), Some(Source::External(1)));
        assert!(engine.channel2_controls_enabled());
    }

    #[test]
    fn mid_side_routes_through_codec() {
        let mut engine = engine();
        set(&mut engine, StereoParam::MidSide, 1.0);
        let g = engine.graph();
        let n = engine.nodes;
        assert_eq!(g.binding(n.power[1], 0), Some(Source::output(n.encoder, 1)));
        assert_eq!(g.binding(n.applier[0], 1), Some(Source::output(n.encoder, 0)));
        assert_eq!(g.binding(n.drywet[1], 0), Some(Source::output(n.decoder, 1)));
        assert_eq!(g.binding(n.drywet[1], 1), Some(Source::External(1)));
    }

    #[test]
    fn inactive_channel_bypasses_its_chain() {
        let mut engine = engine();
        set(&mut engine, StereoParam::Active(Channel::One), 0.0);
        set(&mut engine, StereoParam::MidSide, 1.0);
        let n = engine.nodes;
        assert_eq!(
            engine.graph().binding(n.decoder, 0),
            Some(Source::output(n.encoder, 0))
        );
        set(&mut engine, StereoParam::MidSide, 0.0);
        assert_eq!(engine.graph().binding(n.drywet[0], 0), Some(Source::External(0)));
    }

    #[test]
    fn link_sums_power_and_shares_gain() {
        let mut engine = engine();
        set(&mut engine, StereoParam::Link, 1.0);
        let g = engine.graph();
        let n = engine.nodes;
        assert_eq!(g.binding(n.gain[0], 0), Some(Source::node(n.sum)));
        assert_eq!(g.binding(n.applier[1], 0), Some(Source::node(n.smoother[0])));
        assert!(!engine.channel2_controls_enabled());
    }

    #[test]
    fn routing_is_independent_of_switch_order() {
        let mut a = engine();
        set(&mut a, StereoParam::MidSide, 1.0);
        set(&mut a, StereoParam::Link, 1.0);
        set(&mut a, StereoParam::Active(Channel::Two), 0.0);

        let mut b = engine();
        set(&mut b, StereoParam::Active(Channel::Two), 0.0);
        set(&mut b, StereoParam::Link, 1.0);
        set(&mut b, StereoParam::MidSide, 1.0);

        assert_eq!(a.routing(), b.routing());
        for node in [a.nodes.power[0], a.nodes.gain[0], a.nodes.applier[1], a.nodes.decoder, a.nodes.drywet[1]] {
            for port in 0..2 {
                assert_eq!(a.graph().binding(node, port), b.graph().binding(node, port));
            }
        }
    }

    #[test]
    fn link_copies_and_restores_makeup() {
        let mut engine = engine();
        let makeup1 = StereoParam::Channel(Channel::One, ChannelControl::Makeup);
        let makeup2 = StereoParam::Channel(Channel::Two, ChannelControl::Makeup);
        set(&mut engine, makeup1, 6.0);
        set(&mut engine, makeup2, 12.0);
        let stage_db = |e: &StereoEngine| {
            e.graph()
                .stage::<Volume>(e.nodes.makeup[1])
                .map(Volume::volume_db)
        };
        assert_eq!(stage_db(&engine), Some(12.0));

        set(&mut engine, StereoParam::Link, 1.0);
        assert_eq!(stage_db(&engine), Some(6.0));
        set(&mut engine, makeup1, 9.0);
        assert_eq!(stage_db(&engine), Some(9.0));
        set(&mut engine, makeup2, 3.0);
        assert_eq!(stage_db(&engine), Some(9.0));

        set(&mut engine, StereoParam::Link, 0.0);
        assert_eq!(stage_db(&engine), Some(3.0));
    }

    #[test]
    fn switches_snap_to_on_off() {
        let mut engine = engine();
        set(&mut engine, StereoParam::Link, 0.8);
        assert_eq!(engine.parameter(StereoParam::Link), 1.0);
        assert!(engine.routing().link);
        set(&mut engine, StereoParam::Link, f64::NAN);
        assert!(engine.routing().link);
    }

    #[test]
    fn wrong_channel_count_is_rejected() {
        let mut engine = engine();
        let a = [0.0; 16];
        let mut out = [0.0; 16];
        assert_eq!(
            engine.process(&[&a], &mut [&mut out]),
            Err(EngineError::ChannelCount { expected: 2, found: 1 })
        );
    }
}
