//! Parameter introspection for the compressor engines.
//!
//! Engines expose their controls through the [`ParameterInfo`] trait. Each
//! control is described by a [`ParamDescriptor`] holding the display name,
//! unit, range, default, step and response curve ([`ParamScale`]). The
//! descriptor is also the single place where incoming values are clamped,
//! so stage coefficients never see out-of-range input.
//!
//! # Example
//!
//! ```rust
//! use pressor_core::{ParameterInfo, ParamDescriptor, ParamId, ParamScale};
//!
//! struct Makeup {
//!     gain_db: f64,
//! }
//!
//! impl ParameterInfo for Makeup {
//!     fn param_count(&self) -> usize { 1 }
//!
//!     fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
//!         match index {
//!             0 => Some(ParamDescriptor::gain_db("Makeup Gain", "Makeup", 0.0, 40.0, 0.0)
//!                 .with_scale(ParamScale::Power(2.0))
//!                 .with_id(ParamId(7), "makeup")),
//!             _ => None,
//!         }
//!     }
//!
//!     fn get_param(&self, index: usize) -> f64 {
//!         match index {
//!             0 => self.gain_db,
//!             _ => 0.0,
//!         }
//!     }
//!
//!     fn set_param(&mut self, index: usize, value: f64) {
//!         if let Some(desc) = self.param_info(index) {
//!             self.gain_db = desc.clamp(value);
//!         }
//!     }
//! }
//!
//! let mut makeup = Makeup { gain_db: 0.0 };
//! makeup.set_param(0, 99.0);
//! assert_eq!(makeup.get_param(0), 40.0);
//! ```

/// Response curve for mapping a parameter to normalized \[0.0, 1.0\] space.
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`
/// - **Power(exp)**: `normalized = ((value - min) / (max - min)).powf(1.0 / exp)`
///
/// `Power(2.0)` is the "exponential" knob response used by most compressor
/// controls: more resolution at the low end of the range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamScale {
    /// Linear mapping (default).
    #[default]
    Linear,
    /// Logarithmic mapping. Requires `min > 0.0`.
    Logarithmic,
    /// Power curve mapping with the given shape exponent.
    Power(f64),
}

/// Stable parameter identifier that survives reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub u32);

/// Parameter capability flags.
///
/// ```rust
/// use pressor_core::ParamFlags;
///
/// let flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
/// assert!(flags.contains(ParamFlags::STEPPED));
/// assert!(!flags.contains(ParamFlags::READ_ONLY));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Host can automate this parameter (default for all params).
    pub const AUTOMATABLE: Self = Self(1 << 0);
    /// Parameter has discrete steps (switches).
    pub const STEPPED: Self = Self(1 << 1);
    /// Parameter is read-only (metering, display only).
    pub const READ_ONLY: Self = Self(1 << 2);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::AUTOMATABLE
    }
}

/// Index-based parameter access.
///
/// Indices are stable for the lifetime of the implementor. Implementations
/// must clamp incoming values to the descriptor range and ignore unknown
/// indices.
pub trait ParameterInfo {
    /// Number of parameters. Valid indices are `0..param_count()`.
    fn param_count(&self) -> usize;

    /// Descriptor for the parameter at `index`, or `None` if out of range.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Current value of the parameter at `index` (0.0 for unknown indices).
    fn get_param(&self, index: usize) -> f64;

    /// Sets the parameter at `index`. Unknown indices are ignored.
    fn set_param(&mut self, index: usize, value: f64);

    /// Finds a parameter by full or short name (case-insensitive).
    fn find_param_by_name(&self, name: &str) -> Option<usize> {
        (0..self.param_count()).find(|&i| {
            self.param_info(i).is_some_and(|desc| {
                desc.name.eq_ignore_ascii_case(name) || desc.short_name.eq_ignore_ascii_case(name)
            })
        })
    }

    /// Finds a parameter by its `string_id`.
    fn find_param_by_string_id(&self, string_id: &str) -> Option<usize> {
        (0..self.param_count()).find(|&i| self.param_info(i).is_some_and(|d| d.string_id == string_id))
    }
}

/// Metadata for a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Full parameter name for display (e.g., "Threshold ch1").
    pub name: &'static str,
    /// Short name, max 8 characters.
    pub short_name: &'static str,
    /// Unit type for formatting the parameter value.
    pub unit: ParamUnit,
    /// Minimum allowed value.
    pub min: f64,
    /// Maximum allowed value.
    pub max: f64,
    /// Default value.
    pub default: f64,
    /// Recommended step increment.
    pub step: f64,
    /// Stable numeric ID.
    pub id: ParamId,
    /// Human-readable stable ID used by configuration files.
    pub string_id: &'static str,
    /// Normalization curve.
    pub scale: ParamScale,
    /// Capability flags.
    pub flags: ParamFlags,
}

impl ParamDescriptor {
    /// Generic continuous parameter without a unit.
    pub fn plain(
        name: &'static str,
        short_name: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::None,
            min,
            max,
            default,
            step: 0.1,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Linear,
            flags: ParamFlags::AUTOMATABLE,
        }
    }

    /// On/off switch (0.0 or 1.0).
    pub fn switch(name: &'static str, short_name: &'static str, default: bool) -> Self {
        Self {
            step: 1.0,
            default: if default { 1.0 } else { 0.0 },
            flags: ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED),
            ..Self::plain(name, short_name, 0.0, 1.0, 0.0)
        }
    }

    /// Time parameter in milliseconds.
    pub fn time_ms(
        name: &'static str,
        short_name: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            unit: ParamUnit::Milliseconds,
            ..Self::plain(name, short_name, min, max, default)
        }
    }

    /// Gain or level parameter in decibels.
    pub fn gain_db(
        name: &'static str,
        short_name: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            unit: ParamUnit::Decibels,
            ..Self::plain(name, short_name, min, max, default)
        }
    }

    /// Frequency parameter in Hz.
    pub fn frequency_hz(
        name: &'static str,
        short_name: &'static str,
        min: f64,
        max: f64,
        default: f64,
    ) -> Self {
        Self {
            unit: ParamUnit::Hertz,
            step: 1.0,
            ..Self::plain(name, short_name, min, max, default)
        }
    }

    /// Sets the stable parameter ID and string ID.
    pub const fn with_id(mut self, id: ParamId, string_id: &'static str) -> Self {
        self.id = id;
        self.string_id = string_id;
        self
    }

    /// Sets the normalization scale.
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the unit.
    pub const fn with_unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Sets the step increment.
    pub const fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Returns `true` for stepped on/off parameters.
    #[inline]
    pub fn is_switch(&self) -> bool {
        self.flags.contains(ParamFlags::STEPPED) && self.min == 0.0 && self.max == 1.0
    }

    /// Clamps a value to this parameter's range.
    ///
    /// ```rust
    /// use pressor_core::ParamDescriptor;
    ///
    /// let desc = ParamDescriptor::gain_db("Threshold", "Thresh", -40.0, 0.0, 0.0);
    /// assert_eq!(desc.clamp(-100.0), -40.0);
    /// assert_eq!(desc.clamp(6.0), 0.0);
    /// ```
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Returns `true` if `value` is finite and within `min..=max`.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Converts a plain value to normalized range (0.0 to 1.0).
    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                libm::log(value / self.min) / libm::log(self.max / self.min)
            }
            ParamScale::Power(exp) => {
                let linear = ((value - self.min) / range).clamp(0.0, 1.0);
                libm::pow(linear, 1.0 / exp)
            }
        }
    }

    /// Converts a normalized value (0.0 to 1.0) to the parameter range.
    ///
    /// ```rust
    /// use pressor_core::{ParamDescriptor, ParamScale};
    ///
    /// let desc = ParamDescriptor::time_ms("Attack", "Attack", 1.0, 100.0, 10.0)
    ///     .with_scale(ParamScale::Power(2.0));
    /// assert_eq!(desc.denormalize(0.5), 1.0 + 0.25 * 99.0);
    /// ```
    #[inline]
    pub fn denormalize(&self, normalized: f64) -> f64 {
        match self.scale {
            ParamScale::Linear => self.min + normalized * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * libm::pow(self.max / self.min, normalized)
            }
            ParamScale::Power(exp) => {
                let curved = libm::pow(normalized, exp);
                self.min + curved * (self.max - self.min)
            }
        }
    }
}

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Decibels (dB).
    Decibels,
    /// Hertz (Hz).
    Hertz,
    /// Milliseconds (ms).
    Milliseconds,
    /// Ratio (n:1).
    Ratio,
    /// No unit.
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    ///
    /// ```rust
    /// use pressor_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Decibels.suffix(), " dB");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Ratio => ":1",
            ParamUnit::None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestStage {
        threshold_db: f64,
        enabled: bool,
    }

    impl ParameterInfo for TestStage {
        fn param_count(&self) -> usize {
            2
        }

        fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
            match index {
                0 => Some(
                    ParamDescriptor::gain_db("Threshold", "Thresh", -40.0, 0.0, 0.0)
                        .with_id(ParamId(10), "threshold"),
                ),
                1 => Some(ParamDescriptor::switch("Enable", "On", true).with_id(ParamId(11), "enable")),
                _ => None,
            }
        }

        fn get_param(&self, index: usize) -> f64 {
            match index {
                0 => self.threshold_db,
                1 => f64::from(u8::from(self.enabled)),
                _ => 0.0,
            }
        }

        fn set_param(&mut self, index: usize, value: f64) {
            let Some(desc) = self.param_info(index) else {
                return;
            };
            match index {
                0 => self.threshold_db = desc.clamp(value),
                1 => self.enabled = desc.clamp(value) >= 0.5,
                _ => {}
            }
        }
    }

    #[test]
    fn set_param_clamps() {
        let mut stage = TestStage { threshold_db: 0.0, enabled: true };
        stage.set_param(0, -80.0);
        assert_eq!(stage.get_param(0), -40.0);
        stage.set_param(1, 0.0);
        assert_eq!(stage.get_param(1), 0.0);
    }

    #[test]
    fn unknown_index_is_ignored() {
        let mut stage = TestStage { threshold_db: -3.0, enabled: true };
        stage.set_param(9, 1.0);
        assert_eq!(stage.get_param(0), -3.0);
        assert!(stage.param_info(9).is_none());
    }

    #[test]
    fn lookup_by_name_and_string_id() {
        let stage = TestStage { threshold_db: 0.0, enabled: true };
        assert_eq!(stage.find_param_by_name("thresh"), Some(0));
        assert_eq!(stage.find_param_by_name("ENABLE"), Some(1));
        assert_eq!(stage.find_param_by_string_id("enable"), Some(1));
        assert_eq!(stage.find_param_by_string_id("missing"), None);
    }

    #[test]
    fn switch_descriptor() {
        let desc = ParamDescriptor::switch("Link channels", "Link", false);
        assert!(desc.is_switch());
        assert_eq!(desc.default, 0.0);
        assert!(!ParamDescriptor::plain("Ratio", "Ratio", 1.0, 100.0, 2.0).is_switch());
    }

    #[test]
    fn power_scale_roundtrip() {
        let desc = ParamDescriptor::frequency_hz("Low cut", "LowCut", 20.0, 1000.0, 100.0)
            .with_scale(ParamScale::Power(2.0));
        for i in 0..=10 {
            let norm = f64::from(i) / 10.0;
            let back = desc.normalize(desc.denormalize(norm));
            assert!((back - norm).abs() < 1e-12, "{norm} -> {back}");
        }
    }

    #[test]
    fn linear_normalize() {
        let desc = ParamDescriptor::plain("Dry/Wet", "Mix", 0.0, 1.0, 1.0);
        assert_eq!(desc.normalize(0.25), 0.25);
        assert_eq!(desc.denormalize(0.75), 0.75);
    }

    #[test]
    fn contains_rejects_non_finite() {
        let desc = ParamDescriptor::plain("Ratio", "Ratio", 1.0, 100.0, 2.0);
        assert!(desc.contains(4.0));
        assert!(!desc.contains(f64::NAN));
        assert!(!desc.contains(0.5));
    }
}
