//! # thrash-scenarios
//!
//! Scenario tests for the gateway thrasher.
//!
//! Every scenario runs real thrasher, verifier, and coordinator loops
//! against an in-memory [`MockFleet`](thrash_engine::mock::MockFleet), most
//! of them on tokio's paused clock so hour-long runs finish instantly.
//! The [`assertions`] module holds the pure property checks the scenarios
//! apply to what the fleet recorded.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assertions;

pub mod scenarios;
