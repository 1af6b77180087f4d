//! Thrash scenarios.
//!
//! - `properties` - Rate limit, concurrency bound, revive completeness, determinism
//! - `examples` - The three-gateway quota run and the failing-stop run
//! - `coordination` - Paired thrashers never overlap their disruption windows
//! - `verification` - Verifier alongside a running thrasher

#[cfg(test)]
mod coordination;
#[cfg(test)]
mod examples;
#[cfg(test)]
mod properties;
#[cfg(test)]
mod verification;
