//! Error types for thrash-engine.

use std::fmt;
use thiserror::Error;
use thrash_types::{ConfigError, DaemonId};

/// A daemon control operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DaemonOp {
    /// Graceful stop.
    Stop,
    /// SIGKILL.
    Kill,
    /// Start.
    Start,
    /// Restart (revive).
    Restart,
}

impl fmt::Display for DaemonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DaemonOp::Stop => "stop",
            DaemonOp::Kill => "kill",
            DaemonOp::Start => "start",
            DaemonOp::Restart => "restart",
        };
        f.write_str(s)
    }
}

/// Errors raised by a [`Daemon`](crate::Daemon) implementation.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// The control command ran and reported failure.
    #[error("command failed on {daemon}: {command}: {detail}")]
    CommandFailed {
        /// Daemon being controlled.
        daemon: String,
        /// Command that failed.
        command: String,
        /// Error output or exit status.
        detail: String,
    },

    /// The host owning the daemon could not be reached.
    #[error("{daemon} unreachable: {detail}")]
    Unreachable {
        /// Daemon being controlled.
        daemon: String,
        /// Transport error.
        detail: String,
    },

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

/// A health check could not be executed at all.
#[derive(Debug, Error)]
pub enum HealthError {
    /// The status query did not run to completion.
    #[error("check {check} could not run: {detail}")]
    Unavailable {
        /// Name of the check.
        check: String,
        /// Underlying error.
        detail: String,
    },
}

/// Terminal failure of a thrasher or verifier loop.
#[derive(Debug, Error)]
pub enum ThrashError {
    /// Configuration rejected at start.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A stop, kill, start, or restart failed.
    #[error("{op} of {daemon} failed: {source}")]
    DaemonOperation {
        /// Daemon the operation targeted.
        daemon: DaemonId,
        /// The operation.
        op: DaemonOp,
        /// Underlying daemon error.
        #[source]
        source: DaemonError,
    },

    /// The verifier observed an unhealthy sample.
    #[error("health violation in {check}: {detail}")]
    HealthViolation {
        /// Name of the failing check.
        check: String,
        /// Diagnostic text from the check.
        detail: String,
    },

    /// A programming-contract violation inside the loop.
    #[error("internal invariant violated: {0}")]
    Invariant(String),

    /// `start()` called on a loop that was already started.
    #[error("loop already started")]
    AlreadyStarted,

    /// The roster provider failed.
    #[error("roster provider failed: {0}")]
    Roster(#[source] DaemonError),

    /// The spawned loop panicked or was cancelled.
    #[error("loop aborted: {0}")]
    Aborted(String),
}

impl ThrashError {
    /// The daemon involved, for daemon operation failures.
    pub fn daemon(&self) -> Option<&DaemonId> {
        match self {
            ThrashError::DaemonOperation { daemon, .. } => Some(daemon),
            _ => None,
        }
    }
}
