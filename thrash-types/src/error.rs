//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid, unreadable, or out-of-range configuration.
///
/// Raised before a loop starts; a loop that fails validation never
/// enters the running state.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Roster has fewer than two daemons.
    #[error("roster must contain at least 2 daemons, got {size}")]
    RosterTooSmall {
        /// Number of daemons supplied.
        size: usize,
    },

    /// Same daemon identity appears twice in the roster.
    #[error("duplicate daemon in roster: {id}")]
    DuplicateDaemon {
        /// The repeated identity.
        id: String,
    },

    /// A numeric bound is negative.
    #[error("{field} must be non-negative, got {value}")]
    NegativeValue {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A numeric bound is above the largest supported duration.
    #[error("{field} must be at most {max} seconds, got {value}")]
    TooLarge {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
        /// Largest accepted value in seconds.
        max: f64,
    },

    /// A numeric bound is NaN or infinite.
    #[error("{field} must be a finite number")]
    NotFinite {
        /// Name of the offending field.
        field: &'static str,
    },

    /// `kill_methods` is empty.
    #[error("kill_methods must list at least one method")]
    NoKillMethods,

    /// Verifier was started without any health checks.
    #[error("verifier requires at least one health check")]
    NoHealthChecks,

    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse a configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },

    /// Failed to parse an inline configuration string.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
