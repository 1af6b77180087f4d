//! Lifecycle state of a scheduled loop.

use std::fmt;

/// Lifecycle of a thrasher or verifier loop.
///
/// ```text
/// Idle ──start()──► Running ──stop()──► Stopping ──(revives done)──► Stopped
///                      │                                               ▲
///                      └──────────────(captured failure)───────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    /// Constructed, not yet started.
    #[default]
    Idle,
    /// Control loop is running.
    Running,
    /// Stop requested; the loop is finishing in-flight revives.
    Stopping,
    /// Control loop has exited.
    Stopped,
}

impl RunState {
    /// Returns true once the loop has fully exited.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Stopped)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Stopping => "stopping",
            RunState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}
