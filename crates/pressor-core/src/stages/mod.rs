//! Signal-processing stages of the compressor.
//!
//! Every stage implements [`Stage`](crate::Stage). The detector path runs
//! band filter, power estimator, gain computer and attack/release smoother;
//! the audio path runs gain applier, makeup volume and dry/wet mixer.

mod apply_gain;
mod attack_release;
mod band_filter;
mod dry_wet;
mod gain_computer;
mod mid_side;
mod passthrough;
mod power;
mod volume;

pub use apply_gain::{GAIN_PORT, GainApplier, SIGNAL_PORT};
pub use attack_release::AttackRelease;
pub use band_filter::{BAND_FILTER_ORDER, BandFilter};
pub use dry_wet::{DRY_PORT, DryWet, PROCESSED_PORT};
pub use gain_computer::GainComputer;
pub use mid_side::MidSide;
pub use passthrough::{Identity, Sum};
pub use power::{PowerEstimator, PowerMemory};
pub use volume::Volume;
