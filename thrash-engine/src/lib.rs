//! # thrash-engine
//!
//! Runtime for randomized, rate-limited disruption of a daemon fleet.
//!
//! ## Components
//!
//! - [`Thrasher`] - Control loop that stops random victims, waits, revives
//!   them, and repeats, within a per-daemon rolling-window quota
//! - [`Verifier`] - Independent loop sampling [`HealthCheck`]s, capturing the
//!   first violation
//! - [`ThrasherRegistry`] / [`PauseHandle`] - Pairs thrashers over related
//!   subsystems so their disruption windows never overlap
//! - [`Roster`] - Fixed set of [`Daemon`] handles for one run
//!
//! ## Lifecycle
//!
//! ```text
//! start() ──► loop runs on the tokio runtime ──► stop() ──► join() ──► failure()
//! ```
//!
//! Failures inside a loop never propagate across `start()`/`join()`; they are
//! captured and read back with `failure()` after `join()` returns.
//!
//! ## Example
//!
//! ```ignore
//! let mut thrasher = Thrasher::new("nvmeof", roster, config);
//! let mut verifier = Verifier::new("paths", VerifierConfig::default()).with_check(check);
//! thrasher.start()?;
//! verifier.start()?;
//! tokio::time::sleep(run_for).await;
//! thrasher.stop();
//! verifier.stop();
//! thrasher.join().await;
//! verifier.join().await;
//! assert!(thrasher.failure().is_none() && verifier.failure().is_none());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod coordinator;
pub mod daemon;
pub mod error;
pub mod health;
mod lifecycle;
pub mod mock;
pub mod thrasher;
pub mod verifier;

pub use clock::{Clock, TokioClock};
pub use coordinator::{Handoff, PauseHandle, ThrasherRegistry, TurnGuard};
pub use daemon::{Daemon, Roster, RosterProvider};
pub use error::{DaemonError, DaemonOp, HealthError, ThrashError};
pub use health::{HealthCheck, HealthStatus};
pub use lifecycle::StopSignal;
pub use thrasher::{RoundReport, ThrashSummary, Thrasher};
pub use verifier::{Verifier, VerifierSummary};

pub use thrash_types::{ConfigError, DaemonId, KillMethod, RunState, ThrashConfig, VerifierConfig};
