//! TOML settings for both compressor engines.

use serde::{Deserialize, Serialize};
use std::path::Path;

use pressor_engine::{
    Channel, ChannelControl, ChannelEngine, SideChainEngine, SideChainParam, StereoEngine,
    StereoParam,
};

use crate::error::ConfigError;
use crate::validation::{
    ValidationError, ValidationResult, collect, validate_engine_setup, validate_param_value,
};

/// Engine configuration file.
///
/// Every field is optional in the file; missing ones take the engines'
/// parameter defaults. Unknown keys are rejected.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000.0
/// max_block_size = 512
///
/// [sidechain]
/// threshold = -20.0
/// ratio = 4.0
/// sidechain_connected = true
///
/// [stereo]
/// mid_side = true
/// link = false
///
/// [stereo.channel2]
/// active = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Sample rate the engines are built for (Hz).
    pub sample_rate: f64,
    /// Largest block the graphs process in one pass.
    pub max_block_size: usize,
    /// Side-chain engine controls.
    pub sidechain: SideChainSettings,
    /// Stereo engine controls.
    pub stereo: StereoSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            max_block_size: 512,
            sidechain: SideChainSettings::default(),
            stereo: StereoSettings::default(),
        }
    }
}

impl Settings {
    /// Load and validate settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let settings = Self::from_toml_str(&content)?;
        tracing::debug!("Settings: loaded {}", path.display());
        Ok(settings)
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(toml_str)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save the settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!("Settings: saved {}", path.display());
        Ok(())
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks the engine setup and every control against its range.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();
        for result in [
            validate_engine_setup(self.sample_rate, self.max_block_size),
            self.sidechain.validate(),
            self.stereo.validate(),
        ] {
            if let Err(err) = result {
                errors.push(err);
            }
        }
        collect(errors)
    }

    /// Builds a side-chain engine with these settings.
    pub fn build_sidechain(&self) -> Result<SideChainEngine, ConfigError> {
        validate_engine_setup(self.sample_rate, self.max_block_size)?;
        let mut engine = SideChainEngine::new(self.sample_rate, self.max_block_size)?;
        self.apply_sidechain(&mut engine)?;
        Ok(engine)
    }

    /// Builds a stereo engine with these settings.
    pub fn build_stereo(&self) -> Result<StereoEngine, ConfigError> {
        validate_engine_setup(self.sample_rate, self.max_block_size)?;
        let mut engine = StereoEngine::new(self.sample_rate, self.max_block_size)?;
        self.apply_stereo(&mut engine)?;
        Ok(engine)
    }

    /// Pushes the side-chain controls into an existing engine.
    pub fn apply_sidechain(&self, engine: &mut SideChainEngine) -> Result<(), ConfigError> {
        self.sidechain.apply(engine)?;
        Ok(())
    }

    /// Pushes the stereo controls into an existing engine.
    pub fn apply_stereo(&self, engine: &mut StereoEngine) -> Result<(), ConfigError> {
        self.stereo.apply(engine)?;
        Ok(())
    }

    /// Snapshot of two running engines.
    ///
    /// Both engines must run at the same sample rate, since one file stores
    /// a single rate for both.
    pub fn capture(
        sidechain: &SideChainEngine,
        stereo: &StereoEngine,
        max_block_size: usize,
    ) -> ValidationResult<Self> {
        let sample_rate = sidechain.sample_rate();
        if sample_rate != stereo.sample_rate() {
            return Err(ValidationError::SampleRateMismatch {
                sidechain: sample_rate,
                stereo: stereo.sample_rate(),
            });
        }
        Ok(Self {
            sample_rate,
            max_block_size,
            sidechain: SideChainSettings::from_engine(sidechain),
            stereo: StereoSettings::from_engine(stereo),
        })
    }
}

/// Side-chain engine controls, in plain units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SideChainSettings {
    /// Detector high-pass cutoff (Hz).
    pub low_cut: f64,
    /// Detector low-pass cutoff (Hz).
    pub high_cut: f64,
    /// Attack time (ms).
    pub attack: f64,
    /// Release time (ms).
    pub release: f64,
    /// Threshold (dB).
    pub threshold: f64,
    /// Ratio (n:1).
    pub ratio: f64,
    /// Knee softness (log10 of the knee constant).
    pub softness: f64,
    /// Makeup gain (dB).
    pub makeup: f64,
    /// Processed-signal weight.
    pub dry_wet: f64,
    /// Whether the key input drives detection.
    pub sidechain_connected: bool,
}

impl Default for SideChainSettings {
    fn default() -> Self {
        let d = |p: SideChainParam| p.descriptor().default;
        Self {
            low_cut: d(SideChainParam::LowCut),
            high_cut: d(SideChainParam::HighCut),
            attack: d(SideChainParam::Attack),
            release: d(SideChainParam::Release),
            threshold: d(SideChainParam::Threshold),
            ratio: d(SideChainParam::Ratio),
            softness: d(SideChainParam::Softness),
            makeup: d(SideChainParam::Makeup),
            dry_wet: d(SideChainParam::DryWet),
            sidechain_connected: true,
        }
    }
}

impl SideChainSettings {
    /// Reads the current controls of an engine.
    pub fn from_engine(engine: &SideChainEngine) -> Self {
        let p = |param| engine.parameter(param);
        Self {
            low_cut: p(SideChainParam::LowCut),
            high_cut: p(SideChainParam::HighCut),
            attack: p(SideChainParam::Attack),
            release: p(SideChainParam::Release),
            threshold: p(SideChainParam::Threshold),
            ratio: p(SideChainParam::Ratio),
            softness: p(SideChainParam::Softness),
            makeup: p(SideChainParam::Makeup),
            dry_wet: p(SideChainParam::DryWet),
            sidechain_connected: engine.sidechain_connected(),
        }
    }

    /// Plain value of one control.
    pub fn value(&self, param: SideChainParam) -> f64 {
        match param {
            SideChainParam::LowCut => self.low_cut,
            SideChainParam::HighCut => self.high_cut,
            SideChainParam::Attack => self.attack,
            SideChainParam::Release => self.release,
            SideChainParam::Threshold => self.threshold,
            SideChainParam::Ratio => self.ratio,
            SideChainParam::Softness => self.softness,
            SideChainParam::Makeup => self.makeup,
            SideChainParam::DryWet => self.dry_wet,
        }
    }

    /// Checks every control against its descriptor.
    pub fn validate(&self) -> ValidationResult<()> {
        collect(
            SideChainParam::ALL
                .iter()
                .filter_map(|&p| validate_param_value(&p.descriptor(), self.value(p)).err())
                .collect(),
        )
    }

    /// Validates, then sets every control on `engine`.
    pub fn apply(&self, engine: &mut SideChainEngine) -> ValidationResult<()> {
        self.validate()?;
        for param in SideChainParam::ALL {
            engine.on_parameter_changed(param.index(), self.value(param));
        }
        engine.set_sidechain_connected(self.sidechain_connected);
        Ok(())
    }
}

/// Per-channel controls of the stereo engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelSettings {
    /// Compress this channel.
    pub active: bool,
    /// Attack time (ms).
    pub attack: f64,
    /// Release time (ms).
    pub release: f64,
    /// Threshold (dB).
    pub threshold: f64,
    /// Ratio (n:1).
    pub ratio: f64,
    /// Knee softness (log10 of the knee constant).
    pub softness: f64,
    /// Makeup gain (dB).
    pub makeup: f64,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self::defaults_for(Channel::One)
    }
}

impl ChannelSettings {
    fn defaults_for(channel: Channel) -> Self {
        let d = |control| StereoParam::Channel(channel, control).descriptor().default;
        Self {
            active: StereoParam::Active(channel).descriptor().default >= 0.5,
            attack: d(ChannelControl::Attack),
            release: d(ChannelControl::Release),
            threshold: d(ChannelControl::Threshold),
            ratio: d(ChannelControl::Ratio),
            softness: d(ChannelControl::Softness),
            makeup: d(ChannelControl::Makeup),
        }
    }

    fn from_engine(engine: &StereoEngine, channel: Channel) -> Self {
        let p = |control| engine.parameter(StereoParam::Channel(channel, control));
        Self {
            active: engine.routing().is_active(channel),
            attack: p(ChannelControl::Attack),
            release: p(ChannelControl::Release),
            threshold: p(ChannelControl::Threshold),
            ratio: p(ChannelControl::Ratio),
            softness: p(ChannelControl::Softness),
            makeup: p(ChannelControl::Makeup),
        }
    }

    /// Plain value of one control.
    pub fn value(&self, control: ChannelControl) -> f64 {
        match control {
            ChannelControl::Attack => self.attack,
            ChannelControl::Release => self.release,
            ChannelControl::Threshold => self.threshold,
            ChannelControl::Ratio => self.ratio,
            ChannelControl::Softness => self.softness,
            ChannelControl::Makeup => self.makeup,
        }
    }
}

/// Stereo engine controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StereoSettings {
    /// Process mid/side instead of left/right.
    pub mid_side: bool,
    /// Drive both channels from channel 1's detector.
    pub link: bool,
    /// Processed-signal weight.
    pub dry_wet: f64,
    /// Left, or mid.
    pub channel1: ChannelSettings,
    /// Right, or side. Ignored while linked, except for `active`.
    pub channel2: ChannelSettings,
}

impl Default for StereoSettings {
    fn default() -> Self {
        Self {
            mid_side: false,
            link: false,
            dry_wet: StereoParam::DryWet.descriptor().default,
            channel1: ChannelSettings::defaults_for(Channel::One),
            channel2: ChannelSettings::defaults_for(Channel::Two),
        }
    }
}

impl StereoSettings {
    /// Reads the current controls of an engine.
    pub fn from_engine(engine: &StereoEngine) -> Self {
        let routing = engine.routing();
        Self {
            mid_side: routing.mid_side,
            link: routing.link,
            dry_wet: engine.parameter(StereoParam::DryWet),
            channel1: ChannelSettings::from_engine(engine, Channel::One),
            channel2: ChannelSettings::from_engine(engine, Channel::Two),
        }
    }

    fn channel(&self, channel: Channel) -> &ChannelSettings {
        match channel {
            Channel::One => &self.channel1,
            Channel::Two => &self.channel2,
        }
    }

    /// Plain value of every stereo parameter, in host index order.
    pub fn values(&self) -> [(StereoParam, f64); StereoParam::COUNT] {
        let flag = |on: bool| if on { 1.0 } else { 0.0 };
        let mut values = [(StereoParam::DryWet, self.dry_wet); StereoParam::COUNT];
        values[0] = (StereoParam::MidSide, flag(self.mid_side));
        values[1] = (StereoParam::Link, flag(self.link));
        for channel in [Channel::One, Channel::Two] {
            let settings = self.channel(channel);
            let active = StereoParam::Active(channel);
            values[active.index()] = (active, flag(settings.active));
            for control in ChannelControl::ALL {
                let param = StereoParam::Channel(channel, control);
                values[param.index()] = (param, settings.value(control));
            }
        }
        values
    }

    /// Checks every continuous control against its descriptor.
    pub fn validate(&self) -> ValidationResult<()> {
        collect(
            self.values()
                .iter()
                .filter_map(|(p, v)| validate_param_value(&p.descriptor(), *v).err())
                .collect(),
        )
    }

    /// Validates, then sets every control on `engine`.
    pub fn apply(&self, engine: &mut StereoEngine) -> ValidationResult<()> {
        self.validate()?;
        for (param, value) in self.values() {
            engine.on_parameter_changed(param.index(), value);
        }
        Ok(())
    }
}
