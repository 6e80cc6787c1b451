//! Parameter tables of the two engines and the value store behind them.
//!
//! Continuous controls use [`ParamScale::Power(2.0)`](ParamScale::Power)
//! so that half travel lands at a quarter of the range; dry/wet is linear
//! and the routing switches are stepped 0/1 parameters.

use pressor_core::{ParamDescriptor, ParamId, ParamScale, ParamUnit};

const RESPONSE: ParamScale = ParamScale::Power(2.0);

/// Controls of the side-chain engine, in host index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideChainParam {
    /// Detector high-pass cutoff (Hz).
    LowCut,
    /// Detector low-pass cutoff (Hz).
    HighCut,
    /// Attack time (ms).
    Attack,
    /// Release time (ms).
    Release,
    /// Threshold (dB).
    Threshold,
    /// Ratio (n:1).
    Ratio,
    /// Knee softness, log10 of the knee constant.
    Softness,
    /// Makeup gain (dB).
    Makeup,
    /// Processed-signal weight, 1 = fully processed.
    DryWet,
}

impl SideChainParam {
    /// Number of side-chain parameters.
    pub const COUNT: usize = 9;

    /// All parameters in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::LowCut,
        Self::HighCut,
        Self::Attack,
        Self::Release,
        Self::Threshold,
        Self::Ratio,
        Self::Softness,
        Self::Makeup,
        Self::DryWet,
    ];

    /// Parameter at host index `index`.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Host index of this parameter.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Range, default and display metadata.
    pub fn descriptor(self) -> ParamDescriptor {
        match self {
            Self::LowCut => ParamDescriptor::frequency_hz("Low Cut", "LowCut", 20.0, 1000.0, 100.0)
                .with_scale(RESPONSE)
                .with_id(ParamId(100), "sc_low_cut"),
            Self::HighCut => {
                ParamDescriptor::frequency_hz("High Cut", "HighCut", 100.0, 2000.0, 2000.0)
                    .with_scale(RESPONSE)
                    .with_id(ParamId(101), "sc_high_cut")
            }
            Self::Attack => ParamDescriptor::time_ms("Attack", "Attack", 1.0, 100.0, 10.0)
                .with_scale(RESPONSE)
                .with_id(ParamId(102), "sc_attack"),
            Self::Release => ParamDescriptor::time_ms("Release", "Release", 1.0, 100.0, 10.0)
                .with_scale(RESPONSE)
                .with_id(ParamId(103), "sc_release"),
            Self::Threshold => ParamDescriptor::gain_db("Threshold", "Thresh", -40.0, 0.0, 0.0)
                .with_scale(RESPONSE)
                .with_id(ParamId(104), "sc_threshold"),
            Self::Ratio => ParamDescriptor::plain("Ratio", "Ratio", 1.0, 100.0, 2.0)
                .with_unit(ParamUnit::Ratio)
                .with_scale(RESPONSE)
                .with_id(ParamId(105), "sc_ratio"),
            Self::Softness => ParamDescriptor::plain("Softness", "Soft", -4.0, 0.0, -2.0)
                .with_scale(RESPONSE)
                .with_id(ParamId(106), "sc_softness"),
            Self::Makeup => ParamDescriptor::gain_db("Makeup Gain", "Makeup", 0.0, 40.0, 0.0)
                .with_scale(RESPONSE)
                .with_id(ParamId(107), "sc_makeup"),
            Self::DryWet => ParamDescriptor::plain("Dry/Wet", "Mix", 0.0, 1.0, 1.0)
                .with_step(0.01)
                .with_id(ParamId(108), "sc_dry_wet"),
        }
    }
}

/// One of the two stereo channels (left/right, or mid/side in M/S mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Left, or mid.
    One,
    /// Right, or side.
    Two,
}

impl Channel {
    /// Zero-based channel index.
    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }
}

/// Per-channel controls of the stereo engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelControl {
    /// Attack time (ms).
    Attack,
    /// Release time (ms).
    Release,
    /// Threshold (dB).
    Threshold,
    /// Ratio (n:1).
    Ratio,
    /// Knee softness, log10 of the knee constant.
    Softness,
    /// Makeup gain (dB).
    Makeup,
}

impl ChannelControl {
    /// All per-channel controls in host index order.
    pub const ALL: [Self; 6] = [
        Self::Attack,
        Self::Release,
        Self::Threshold,
        Self::Ratio,
        Self::Softness,
        Self::Makeup,
    ];
}

/// Controls of the stereo engine, in host index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StereoParam {
    /// Process mid/side instead of left/right.
    MidSide,
    /// Drive both channels from one detector.
    Link,
    /// Compress this channel.
    Active(Channel),
    /// Per-channel control.
    Channel(Channel, ChannelControl),
    /// Processed-signal weight, 1 = fully processed.
    DryWet,
}

impl StereoParam {
    /// Number of stereo parameters.
    pub const COUNT: usize = 17;

    const FIRST_CH1: usize = 4;
    const FIRST_CH2: usize = 10;

    /// Parameter at host index `index`.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::MidSide),
            1 => Some(Self::Link),
            2 => Some(Self::Active(Channel::One)),
            3 => Some(Self::Active(Channel::Two)),
            4..=9 => Some(Self::Channel(Channel::One, ChannelControl::ALL[index - Self::FIRST_CH1])),
            10..=15 => Some(Self::Channel(Channel::Two, ChannelControl::ALL[index - Self::FIRST_CH2])),
            16 => Some(Self::DryWet),
            _ => None,
        }
    }

    /// Host index of this parameter.
    pub fn index(self) -> usize {
        match self {
            Self::MidSide => 0,
            Self::Link => 1,
            Self::Active(channel) => 2 + channel.index(),
            Self::Channel(channel, control) => {
                let first = match channel {
                    Channel::One => Self::FIRST_CH1,
                    Channel::Two => Self::FIRST_CH2,
                };
                first + control as usize
            }
            Self::DryWet => 16,
        }
    }

    /// Range, default and display metadata.
    pub fn descriptor(self) -> ParamDescriptor {
        let id = ParamId(200 + self.index() as u32);
        match self {
            Self::MidSide => ParamDescriptor::switch("Mid/Side", "M/S", false).with_id(id, "st_mid_side"),
            Self::Link => ParamDescriptor::switch("Link", "Link", false).with_id(id, "st_link"),
            Self::Active(Channel::One) => {
                ParamDescriptor::switch("Channel 1", "Ch1 On", true).with_id(id, "st_active_1")
            }
            Self::Active(Channel::Two) => {
                ParamDescriptor::switch("Channel 2", "Ch2 On", true).with_id(id, "st_active_2")
            }
            Self::Channel(channel, control) => channel_descriptor(channel, control).with_id(
                id,
                channel_string_id(channel, control),
            ),
            Self::DryWet => ParamDescriptor::plain("Dry/Wet", "Mix", 0.0, 1.0, 1.0)
                .with_step(0.01)
                .with_id(id, "st_dry_wet"),
        }
    }
}

fn channel_descriptor(channel: Channel, control: ChannelControl) -> ParamDescriptor {
    let one = channel == Channel::One;
    let desc = match control {
        ChannelControl::Attack => ParamDescriptor::time_ms(
            if one { "Attack ch1" } else { "Attack ch2" },
            if one { "Atk1" } else { "Atk2" },
            1.0,
            100.0,
            10.0,
        ),
        ChannelControl::Release => ParamDescriptor::time_ms(
            if one { "Release ch1" } else { "Release ch2" },
            if one { "Rel1" } else { "Rel2" },
            1.0,
            100.0,
            10.0,
        ),
        ChannelControl::Threshold => ParamDescriptor::gain_db(
            if one { "Threshold ch1" } else { "Threshold ch2" },
            if one { "Thresh1" } else { "Thresh2" },
            -40.0,
            0.0,
            0.0,
        ),
        ChannelControl::Ratio => ParamDescriptor::plain(
            if one { "Ratio ch1" } else { "Ratio ch2" },
            if one { "Ratio1" } else { "Ratio2" },
            1.0,
            100.0,
            2.0,
        )
        .with_unit(ParamUnit::Ratio),
        ChannelControl::Softness => ParamDescriptor::plain(
            if one { "Softness ch1" } else { "Softness ch2" },
            if one { "Soft1" } else { "Soft2" },
            -4.0,
            0.0,
            -2.0,
        ),
        ChannelControl::Makeup => ParamDescriptor::gain_db(
            if one { "Makeup Gain ch1" } else { "Makeup Gain ch2" },
            if one { "Makeup1" } else { "Makeup2" },
            0.0,
            40.0,
            0.0,
        ),
    };
    desc.with_scale(RESPONSE)
}

fn channel_string_id(channel: Channel, control: ChannelControl) -> &'static str {
    match (channel, control) {
        (Channel::One, ChannelControl::Attack) => "st_attack_1",
        (Channel::One, ChannelControl::Release) => "st_release_1",
        (Channel::One, ChannelControl::Threshold) => "st_threshold_1",
        (Channel::One, ChannelControl::Ratio) => "st_ratio_1",
        (Channel::One, ChannelControl::Softness) => "st_softness_1",
        (Channel::One, ChannelControl::Makeup) => "st_makeup_1",
        (Channel::Two, ChannelControl::Attack) => "st_attack_2",
        (Channel::Two, ChannelControl::Release) => "st_release_2",
        (Channel::Two, ChannelControl::Threshold) => "st_threshold_2",
        (Channel::Two, ChannelControl::Ratio) => "st_ratio_2",
        (Channel::Two, ChannelControl::Softness) => "st_softness_2",
        (Channel::Two, ChannelControl::Makeup) => "st_makeup_2",
    }
}

/// Knee constant `S = 10^softness` from the softness control.
pub fn knee_from_softness(softness: f64) -> f64 {
    10f64.powf(softness)
}

/// Brings a raw host value into a descriptor's range.
///
/// Returns `None` for non-finite values. Switches snap to 0 or 1 at 0.5.
pub fn sanitize(descriptor: &ParamDescriptor, value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    if descriptor.is_switch() {
        return Some(if value >= 0.5 { 1.0 } else { 0.0 });
    }
    Some(descriptor.clamp(value))
}

/// Current plain values of `N` parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamStore<const N: usize> {
    values: [f64; N],
}

impl<const N: usize> ParamStore<N> {
    /// Store initialised from each descriptor's default.
    pub fn from_defaults(descriptor: impl Fn(usize) -> Option<ParamDescriptor>) -> Self {
        let mut values = [0.0; N];
        for (index, value) in values.iter_mut().enumerate() {
            if let Some(desc) = descriptor(index) {
                *value = desc.default;
            }
        }
        Self { values }
    }

    /// Value at `index`, or 0 when out of range.
    pub fn get(&self, index: usize) -> f64 {
        self.values.get(index).copied().unwrap_or(0.0)
    }

    /// Switch value at `index` as a bool.
    pub fn flag(&self, index: usize) -> bool {
        self.get(index) >= 0.5
    }

    /// Stores `value`; returns `false` when `index` is out of range.
    pub fn set(&mut self, index: usize, value: f64) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// All values in index order.
    pub fn values(&self) -> &[f64; N] {
        &self.values
    }
}
