//! Configuration for the pressor compressor engines.
//!
//! A [`Settings`] file holds the engine setup (sample rate, maximum block
//! size) and every control of both engines in plain units. Values are
//! checked against the engines' parameter descriptors on load, so a file
//! that would be silently clamped is reported instead.
//!
//! # Example
//!
//! ```rust
//! use pressor_config::Settings;
//! use pressor_engine::{SideChainParam, ChannelEngine};
//!
//! let settings = Settings::from_toml_str(
//!     r#"
//!     sample_rate = 48000.0
//!     [sidechain]
//!     threshold = -24.0
//!     ratio = 6.0
//!     "#,
//! )
//! .unwrap();
//!
//! let engine = settings.build_sidechain().unwrap();
//! assert_eq!(engine.parameter(SideChainParam::Ratio), 6.0);
//! assert_eq!(engine.sample_rate(), 48000.0);
//! ```

mod error;
mod settings;

/// Range validation against parameter descriptors.
pub mod validation;

pub use error::ConfigError;
pub use settings::{ChannelSettings, Settings, SideChainSettings, StereoSettings};
pub use validation::{ValidationError, ValidationResult, validate_param_value};
