//! Thrash history and the rolling-window rate limit.
//!
//! Each daemon has an append-only list of disruption timestamps in
//! chronological order. A daemon is eligible for another disruption only
//! while fewer than `times` of its timestamps fall inside the trailing
//! `period`. It becomes eligible again once enough of the oldest
//! qualifying entries age out of the window.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use thrash_types::DaemonId;

/// Per-daemon disruption quota over a rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuota {
    /// Maximum disruptions within one window.
    pub times: usize,
    /// Window length.
    pub period: Duration,
}

impl RateQuota {
    /// Create a new quota.
    pub fn new(times: usize, period: Duration) -> Self {
        Self { times, period }
    }
}

/// When a daemon may next be disrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Eligible right now.
    Now,
    /// Eligible once the given instant is reached.
    At(Instant),
    /// Never eligible (quota of zero, or a window reaching past any
    /// representable instant).
    Never,
}

/// Disruption timestamps for every daemon the thrasher has touched.
///
/// Owned and mutated exclusively by one thrasher's control loop.
#[derive(Debug, Clone, Default)]
pub struct ThrashHistory {
    records: HashMap<DaemonId, Vec<Instant>>,
}

impl ThrashHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a disruption of `id` at `at`.
    ///
    /// Timestamps must be supplied in non-decreasing order per daemon.
    pub fn record(&mut self, id: &DaemonId, at: Instant) {
        let entries = self.records.entry(id.clone()).or_default();
        debug_assert!(entries.last().map_or(true, |last| *last <= at));
        entries.push(at);
    }

    /// All recorded disruptions of `id`, oldest first.
    pub fn timestamps(&self, id: &DaemonId) -> &[Instant] {
        self.records.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total disruptions of `id` over the whole run.
    pub fn total(&self, id: &DaemonId) -> usize {
        self.timestamps(id).len()
    }

    /// Number of disruptions of `id` within the trailing `period` ending at `now`.
    pub fn count_within(&self, id: &DaemonId, now: Instant, period: Duration) -> usize {
        self.timestamps(id)
            .iter()
            .filter(|t| now.saturating_duration_since(**t) < period)
            .count()
    }

    /// Returns true if `id` is below quota at `now`.
    pub fn is_eligible(&self, id: &DaemonId, now: Instant, quota: RateQuota) -> bool {
        self.count_within(id, now, quota.period) < quota.times
    }

    /// When `id` may next be disrupted.
    pub fn next_eligible(&self, id: &DaemonId, now: Instant, quota: RateQuota) -> Eligibility {
        if quota.times == 0 {
            return Eligibility::Never;
        }

        let window: Vec<Instant> = self
            .timestamps(id)
            .iter()
            .copied()
            .filter(|t| now.saturating_duration_since(*t) < quota.period)
            .collect();

        if window.len() < quota.times {
            return Eligibility::Now;
        }

        // Dropping the oldest (len - times + 1) entries brings the count below quota.
        let pivot = window[window.len() - quota.times];
        pivot
            .checked_add(quota.period)
            .map_or(Eligibility::Never, Eligibility::At)
    }

    /// Highest number of disruptions of `id` inside any window of length `period`.
    ///
    /// Used to audit a finished run against its quota.
    pub fn peak_window_count(&self, id: &DaemonId, period: Duration) -> usize {
        let ts = self.timestamps(id);
        let mut peak = 0;
        let mut start = 0;
        for end in 0..ts.len() {
            while ts[end].saturating_duration_since(ts[start]) >= period {
                start += 1;
            }
            peak = peak.max(end - start + 1);
        }
        peak
    }

    /// Iterate over daemons and their timestamps.
    pub fn iter(&self) -> impl Iterator<Item = (&DaemonId, &[Instant])> {
        self.records.iter().map(|(id, ts)| (id, ts.as_slice()))
    }
}
