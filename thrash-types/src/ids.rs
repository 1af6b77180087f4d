//! Identity types for thrashed daemons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a daemon in the roster.
///
/// Conventionally `<type>.<id>` (e.g. `nvmeof.a`), but any non-empty
/// string is accepted. Ordering follows the string so that summaries
/// print in a stable order.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaemonId(String);

impl DaemonId {
    /// Create a DaemonId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DaemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DaemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DaemonId({})", self.0)
    }
}

impl From<&str> for DaemonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DaemonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How a victim daemon is taken down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillMethod {
    /// Graceful service stop.
    Stop,
    /// Immediate SIGKILL.
    Kill,
}

impl KillMethod {
    /// Get the method as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            KillMethod::Stop => "stop",
            KillMethod::Kill => "kill",
        }
    }
}

impl fmt::Display for KillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
