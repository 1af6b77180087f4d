//! # thrash-types
//!
//! Shared types for the gateway fault-injection harness.
//!
//! This crate provides the foundational types used across all thrash crates:
//! - [`DaemonId`] - Stable identity of a disruptable daemon
//! - [`RunState`] - Lifecycle of a thrasher or verifier loop
//! - [`KillMethod`] - How a victim is taken down
//! - [`ThrashConfig`], [`VerifierConfig`] - Recognized tunables with defaults
//! - [`ConfigError`] - Validation and loading errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod ids;
mod state;

pub use config::{
    ThrashConfig, VerifierConfig, DEFAULT_DELAY_MARGIN_SECS, DEFAULT_MAX_THRASH_PERIOD_SECS,
    DEFAULT_MAX_THRASH_TIMES, MAX_CONFIG_SECS,
};
pub use error::ConfigError;
pub use ids::{DaemonId, KillMethod};
pub use state::RunState;
