//! Property checks over a finished run.
//!
//! These are pure functions over what a run recorded: the thrasher's
//! [`ThrashSummary`] and the fleet's down-set history. They return an
//! [`AssertionResult`] instead of panicking so a scenario can report every
//! violated property at once.

use std::collections::BTreeSet;
use thrash_core::RateQuota;
use thrash_engine::mock::DaemonEvent;
use thrash_engine::ThrashSummary;
use thrash_types::DaemonId;

/// Result of an assertion check.
#[derive(Debug, Clone)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Description of what was checked
    pub description: String,
    /// Details on failure
    pub failure_details: Option<String>,
}

impl AssertionResult {
    /// Create a passing result.
    pub fn pass(description: &str) -> Self {
        Self {
            passed: true,
            description: description.into(),
            failure_details: None,
        }
    }

    /// Create a failing result.
    pub fn fail(description: &str, details: &str) -> Self {
        Self {
            passed: false,
            description: description.into(),
            failure_details: Some(details.into()),
        }
    }

    /// Panic with the failure details if the check failed.
    pub fn assert_passed(&self) {
        if !self.passed {
            panic!(
                "{} FAILED: {}",
                self.description,
                self.failure_details.as_deref().unwrap_or("")
            );
        }
    }
}

/// No daemon exceeds its quota inside any window.
pub fn assert_rate_limit(summary: &ThrashSummary, quota: RateQuota) -> AssertionResult {
    let desc = "rate limit";
    for (id, _) in summary.history.iter() {
        let peak = summary.history.peak_window_count(id, quota.period);
        if peak > quota.times {
            return AssertionResult::fail(
                desc,
                &format!(
                    "{id} disrupted {peak} times within {:?} (quota {})",
                    quota.period, quota.times
                ),
            );
        }
    }
    AssertionResult::pass(desc)
}

/// The down set never exceeds `bound` daemons.
pub fn assert_concurrency_bound(
    down_history: &[BTreeSet<DaemonId>],
    bound: usize,
) -> AssertionResult {
    let desc = "concurrency bound";
    match down_history.iter().find(|down| down.len() > bound) {
        Some(down) => AssertionResult::fail(
            desc,
            &format!("{} daemons down at once (bound {bound}): {down:?}", down.len()),
        ),
        None => AssertionResult::pass(desc),
    }
}

/// Daemons whose ids start with `left` are never down together with daemons
/// whose ids start with `right`.
pub fn assert_disjoint_windows(
    down_history: &[BTreeSet<DaemonId>],
    left: &str,
    right: &str,
) -> AssertionResult {
    let desc = "disjoint disruption windows";
    let overlap = down_history.iter().find(|down| {
        down.iter().any(|id| id.as_str().starts_with(left))
            && down.iter().any(|id| id.as_str().starts_with(right))
    });
    match overlap {
        Some(down) => AssertionResult::fail(desc, &format!("overlapping down set: {down:?}")),
        None => AssertionResult::pass(desc),
    }
}

/// Every daemon taken down is later restarted, and nothing is left down.
pub fn assert_all_revived(events: &[DaemonEvent]) -> AssertionResult {
    let desc = "revive completeness";
    let mut down = BTreeSet::new();
    for event in events {
        if event.is_down() {
            down.insert(event.id().clone());
        } else {
            down.remove(event.id());
        }
    }
    if down.is_empty() {
        AssertionResult::pass(desc)
    } else {
        AssertionResult::fail(desc, &format!("left down: {down:?}"))
    }
}

/// Victim sequence of a run: the victim list of each productive round.
pub fn victim_sequence(summary: &ThrashSummary) -> Vec<Vec<DaemonId>> {
    summary
        .disruptions
        .iter()
        .map(|r| r.victims.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn set(ids: &[&str]) -> BTreeSet<DaemonId> {
        ids.iter().map(|id| DaemonId::from(*id)).collect()
    }

    #[test]
    fn concurrency_bound_detects_excess() {
        let history = vec![set(&["a"]), set(&["a", "b"]), set(&["b"])];
        assert!(assert_concurrency_bound(&history, 2).passed);
        let result = assert_concurrency_bound(&history, 1);
        assert!(!result.passed);
        assert!(result.failure_details.unwrap().contains("2 daemons down"));
    }

    #[test]
    fn disjoint_windows_detects_overlap() {
        let ok = vec![set(&["gw.a"]), set(&[]), set(&["osd.0"])];
        assert!(assert_disjoint_windows(&ok, "gw.", "osd.").passed);

        let bad = vec![set(&["gw.a"]), set(&["gw.a", "osd.0"])];
        assert!(!assert_disjoint_windows(&bad, "gw.", "osd.").passed);
    }

    #[test]
    fn revive_completeness_replays_events() {
        let a = DaemonId::from("a");
        let events = vec![
            DaemonEvent::Stopped(a.clone()),
            DaemonEvent::Restarted(a.clone()),
            DaemonEvent::Killed(a.clone()),
        ];
        assert!(!assert_all_revived(&events).passed);
        assert!(assert_all_revived(&events[..2]).passed);
    }

    #[test]
    fn empty_summary_passes_rate_limit() {
        let summary = ThrashSummary::default();
        assert!(assert_rate_limit(&summary, RateQuota::new(1, Duration::from_secs(10))).passed);
    }
}
