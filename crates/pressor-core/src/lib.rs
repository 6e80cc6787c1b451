//! Pressor Core - signal-graph primitives for a dynamic-range compressor
//!
//! This crate provides the stages and the run-time-rewirable graph that the
//! compressor engines are built from, designed for real-time processing with
//! zero allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Stages
//!
//! - [`Stage`] - Block-processing trait with up to [`MAX_PORTS`] inputs and outputs
//! - [`stages::BandFilter`] - 4th-order Butterworth band limit for the detector
//! - [`stages::PowerEstimator`] - Leaky-integrated squared signal
//! - [`stages::GainComputer`] - Soft-knee power-to-gain mapping
//! - [`stages::AttackRelease`] - Asymmetric one-pole smoother
//! - [`stages::GainApplier`], [`stages::Volume`], [`stages::DryWet`] - Audio path
//! - [`stages::MidSide`], [`stages::Sum`], [`stages::Identity`] - Routing helpers
//!
//! ## Graph
//!
//! - [`SignalGraph`] - Node arena with port bindings and pull evaluation
//! - [`Source`] - Binding target: node output or external channel
//!
//! ## Parameters
//!
//! - [`ParameterInfo`] / [`ParamDescriptor`] - Introspectable parameter metadata
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`db_to_power`], [`time_constant_coeff`], etc.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature in
//! your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! pressor-core = { version = "0.1", default-features = false }
//! ```
//!
//! Enable the `tracing` feature to log graph rebinding and order updates.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod graph;
pub mod math;
pub mod param_info;
pub mod stage;
pub mod stages;

pub use biquad::{Biquad, Coefficients, butterworth_q, highpass_coefficients, lowpass_coefficients};
pub use graph::{GraphError, GraphStage, NodeId, NodeKind, SamplingContext, SignalGraph, Source};
pub use math::{
    MIN_TIME_MS, db_to_linear, db_to_power, flush_denormal, linear_to_db, power_to_db,
    time_constant_coeff,
};
pub use param_info::{ParamDescriptor, ParamFlags, ParamId, ParamScale, ParamUnit, ParameterInfo};
pub use stage::{MAX_PORTS, Stage, StageError};
