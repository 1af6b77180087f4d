//! # thrash-core
//!
//! Pure scheduling logic for the gateway thrasher (no I/O, instant tests).
//!
//! Every randomized or time-dependent decision the thrasher makes lives
//! here as a function of explicit inputs: an RNG, a roster size, a
//! timestamp. The async control loop in `thrash-engine` only sequences
//! these decisions around daemon operations and waits.
//!
//! ## Modules
//!
//! - [`history`] - Per-daemon disruption timestamps and the rolling-window quota
//! - [`select`] - Candidate draw and victim acceptance for one round
//! - [`delay`] - Bounded delay ranges and their sampling
//! - [`settings`] - Validation of raw configuration into resolved settings

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod delay;
pub mod history;
pub mod select;
pub mod settings;

pub use delay::DelayRange;
pub use history::{Eligibility, RateQuota, ThrashHistory};
pub use select::{accept_victims, choose_kill_method, draw_candidates, Selection, SkipReason};
pub use settings::{ThrashSettings, VerifierSettings};
