//! Victim selection for one thrash round.
//!
//! Selection happens in two steps:
//!
//! 1. [`draw_candidates`] gives each daemon an independent `1/n` chance of
//!    becoming a candidate. The expected number of candidates is one, but
//!    any round may produce zero or several.
//! 2. [`accept_victims`] walks candidates in roster order, skipping daemons
//!    at their rate-limit quota, and stops accepting once the per-round cap
//!    is reached.
//!
//! History is read here but never written: the caller appends a timestamp
//! once a victim has actually been taken down.

use crate::history::{Eligibility, RateQuota, ThrashHistory};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Instant;
use thrash_types::{DaemonId, KillMethod};

/// Why a candidate was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Daemon is at its rolling-window quota.
    RateLimited(Eligibility),
    /// The round already has `max_thrash` victims.
    CapReached,
}

/// Outcome of victim acceptance for one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Roster indices of accepted victims, in roster order.
    pub victims: Vec<usize>,
    /// Roster indices of rejected candidates and the reason.
    pub skipped: Vec<(usize, SkipReason)>,
}

impl Selection {
    /// Returns true if no victim was accepted.
    pub fn is_empty(&self) -> bool {
        self.victims.is_empty()
    }
}

/// Draw candidate victims: each of `roster_len` daemons independently with
/// probability `1 / roster_len`.
///
/// Exactly one RNG draw is made per daemon, so the RNG advances the same
/// amount every round regardless of the outcome.
pub fn draw_candidates<R: Rng + ?Sized>(rng: &mut R, roster_len: usize) -> Vec<usize> {
    if roster_len == 0 {
        return Vec::new();
    }
    let weight = 1.0 / roster_len as f64;
    (0..roster_len)
        .filter(|_| rng.gen::<f64>() < weight)
        .collect()
}

/// Accept victims from `candidates` against the quota in `history`.
///
/// `ids` maps roster index to daemon identity. Candidates are visited in
/// ascending roster order.
pub fn accept_victims(
    candidates: &[usize],
    ids: &[DaemonId],
    history: &ThrashHistory,
    now: Instant,
    quota: RateQuota,
    cap: usize,
) -> Selection {
    let mut selection = Selection::default();
    let mut ordered = candidates.to_vec();
    ordered.sort_unstable();
    ordered.dedup();

    for index in ordered {
        let Some(id) = ids.get(index) else {
            continue;
        };
        if selection.victims.len() >= cap {
            selection.skipped.push((index, SkipReason::CapReached));
            continue;
        }
        match history.next_eligible(id, now, quota) {
            Eligibility::Now => selection.victims.push(index),
            other => selection.skipped.push((index, SkipReason::RateLimited(other))),
        }
    }

    selection
}

/// Pick how to take a victim down.
///
/// Draws from the RNG only when randomizing over more than one method.
pub fn choose_kill_method<R: Rng + ?Sized>(
    rng: &mut R,
    methods: &[KillMethod],
    randomize: bool,
) -> KillMethod {
    if randomize && methods.len() > 1 {
        if let Some(m) = methods.choose(rng) {
            return *m;
        }
    }
    methods.first().copied().unwrap_or(KillMethod::Stop)
}
