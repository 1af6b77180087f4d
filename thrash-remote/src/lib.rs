//! # thrash-remote
//!
//! Concrete collaborators for thrashing real gateway clusters over SSH.
//!
//! - [`SshTarget`] - Runs commands on a remote host through the `ssh` binary
//! - [`SystemdDaemon`] - Controls a daemon through its systemd unit
//! - [`OrchDaemon`] - Controls a daemon through the orchestrator CLI
//! - [`CommandCheck`] - Healthy while a status command exits zero
//! - [`PathStateCheck`] - Healthy while an initiator has a live optimized path
//!
//! SSH keys must already be authorized; every command runs in batch mode.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod check;
pub mod daemon;
pub mod paths;
pub mod ssh;

pub use check::{CommandCheck, PathStateCheck};
pub use daemon::{OrchDaemon, SystemdDaemon};
pub use paths::{parse_list_subsys, PathState, PathSummary};
pub use ssh::{SshError, SshResult, SshTarget};
