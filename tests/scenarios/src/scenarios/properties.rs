//! Run-level properties of a single thrasher.

use crate::assertions::{
    assert_all_revived, assert_concurrency_bound, assert_rate_limit, victim_sequence,
};
use std::time::Duration;
use thrash_core::RateQuota;
use thrash_engine::mock::{DaemonEvent, MockFleet};
use thrash_engine::{RunState, ThrashConfig, ThrashSummary, Thrasher};

const FLEET: [&str; 5] = ["gw.a", "gw.b", "gw.c", "gw.d", "gw.e"];

fn fixed_delays(thrash: f64, revive: f64) -> ThrashConfig {
    ThrashConfig {
        min_thrash_delay: thrash,
        max_thrash_delay: Some(thrash),
        min_revive_delay: revive,
        max_revive_delay: Some(revive),
        ..ThrashConfig::default()
    }
}

async fn thrash_for(fleet: &MockFleet, ids: &[&str], config: ThrashConfig, secs: u64) -> ThrashSummary {
    let mut thrasher = Thrasher::new("gateways", fleet.roster(ids).unwrap(), config);
    thrasher.start().unwrap();
    tokio::time::sleep(Duration::from_secs(secs)).await;
    thrasher.stop();
    thrasher.join().await;
    assert!(thrasher.failure().is_none(), "{:?}", thrasher.failure());
    thrasher.summary().cloned().unwrap()
}

// ============================================================================
// Rate limit
// ============================================================================

/// No daemon is disrupted more than `daemon_max_thrash_times` in any window.
#[tokio::test(start_paused = true)]
async fn rate_limit_holds_over_long_run() {
    let fleet = MockFleet::new();
    let config = ThrashConfig {
        daemon_max_thrash_times: 2,
        daemon_max_thrash_period: 50.0,
        ..fixed_delays(1.0, 1.0)
    }
    .deterministic(3);

    let summary = thrash_for(&fleet, &FLEET, config, 2000).await;

    assert_rate_limit(&summary, RateQuota::new(2, Duration::from_secs(50))).assert_passed();
    assert!(summary.total_disruptions() > 0);
    assert_eq!(fleet.down_count(), 0);
}

/// Randomized delays and the default quota.
#[tokio::test(start_paused = true)]
async fn rate_limit_holds_with_randomized_delays() {
    let fleet = MockFleet::new();
    let config = ThrashConfig {
        seed: Some(11),
        min_thrash_delay: 1.0,
        max_thrash_delay: Some(20.0),
        min_revive_delay: 1.0,
        max_revive_delay: Some(10.0),
        ..ThrashConfig::default()
    };

    let summary = thrash_for(&fleet, &FLEET[..3], config, 4 * 3600).await;

    assert_rate_limit(&summary, RateQuota::new(3, Duration::from_secs(1800))).assert_passed();
    assert!(summary.total_disruptions() > 0);
}

// ============================================================================
// Concurrency bound
// ============================================================================

/// At most `max_thrash_daemons` are ever down at once.
#[tokio::test(start_paused = true)]
async fn concurrency_bound_respects_max_thrash() {
    let fleet = MockFleet::new();
    let config = ThrashConfig {
        max_thrash: Some(2),
        daemon_max_thrash_times: 100,
        ..fixed_delays(1.0, 3.0)
    }
    .deterministic(5);

    thrash_for(&fleet, &FLEET, config, 1000).await;

    assert_concurrency_bound(&fleet.down_history(), 2).assert_passed();
    assert!(fleet.peak_down() >= 1);
}

/// A cap equal to the roster size is clamped to roster size - 1.
#[tokio::test(start_paused = true)]
async fn full_roster_cap_is_clamped() {
    let fleet = MockFleet::new();
    let config = ThrashConfig {
        max_thrash: Some(3),
        daemon_max_thrash_times: 1000,
        ..fixed_delays(1.0, 1.0)
    }
    .deterministic(9);

    thrash_for(&fleet, &FLEET[..3], config, 3000).await;

    assert_concurrency_bound(&fleet.down_history(), 2).assert_passed();
}

// ============================================================================
// Revive completeness
// ============================================================================

/// Every victim is restarted before the next round's victims go down.
#[tokio::test(start_paused = true)]
async fn victims_revived_before_next_round() {
    let fleet = MockFleet::new();
    let config = ThrashConfig {
        daemon_max_thrash_times: 100,
        ..fixed_delays(1.0, 2.0)
    }
    .deterministic(17);

    let summary = thrash_for(&fleet, &FLEET, config, 600).await;

    // Replay: once a restart has happened, nothing may go down until every
    // daemon of that round is back up.
    let mut down = 0usize;
    let mut reviving = false;
    for event in fleet.events() {
        match event {
            DaemonEvent::Stopped(_) | DaemonEvent::Killed(_) => {
                assert!(!reviving, "daemon stopped while previous round was reviving");
                down += 1;
            }
            DaemonEvent::Restarted(_) | DaemonEvent::Started(_) => {
                down -= 1;
                reviving = down > 0;
            }
        }
    }
    assert_eq!(down, 0);
    assert_all_revived(&fleet.events()).assert_passed();
    assert!(summary.disruptions.len() > 10);
}

/// Stop during the revive wait still restarts the round's victims.
#[tokio::test(start_paused = true)]
async fn stop_during_revive_wait_completes_revive() {
    let fleet = MockFleet::new();
    let config = fixed_delays(1.0, 120.0).deterministic(23);
    let mut thrasher = Thrasher::new("gateways", fleet.roster(&FLEET).unwrap(), config);
    thrasher.start().unwrap();

    while fleet.down_count() == 0 {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    thrasher.stop();
    assert_eq!(thrasher.state(), RunState::Stopping);
    thrasher.join().await;

    assert_eq!(thrasher.state(), RunState::Stopped);
    assert!(thrasher.failure().is_none());
    assert_eq!(fleet.down_count(), 0);
    assert!(matches!(
        fleet.events().last(),
        Some(DaemonEvent::Restarted(_))
    ));
}

// ============================================================================
// Determinism
// ============================================================================

/// Same seed, fixed delays, same roster: same victims in the same rounds.
#[tokio::test(start_paused = true)]
async fn same_seed_same_victims() {
    let config = ThrashConfig {
        daemon_max_thrash_times: 5,
        daemon_max_thrash_period: 60.0,
        ..fixed_delays(1.0, 1.0)
    }
    .deterministic(42);

    let first = thrash_for(&MockFleet::new(), &FLEET, config.clone(), 500).await;
    let second = thrash_for(&MockFleet::new(), &FLEET, config, 500).await;

    let shared = first.disruptions.len().min(second.disruptions.len());
    assert!(shared > 20, "only {shared} productive rounds");
    assert_eq!(first.disruptions[..shared], second.disruptions[..shared]);
    assert_eq!(first.seed, 42);
}

/// Different seeds diverge.
#[tokio::test(start_paused = true)]
async fn different_seed_different_victims() {
    let config = fixed_delays(1.0, 1.0);

    let first = thrash_for(&MockFleet::new(), &FLEET, config.clone().deterministic(1), 500).await;
    let second = thrash_for(&MockFleet::new(), &FLEET, config.deterministic(2), 500).await;

    assert_ne!(victim_sequence(&first), victim_sequence(&second));
}

/// Without a configured seed one is drawn and reported.
#[tokio::test(start_paused = true)]
async fn random_seed_is_reported() {
    let fleet = MockFleet::new();
    let mut thrasher = Thrasher::new("gateways", fleet.roster(&FLEET).unwrap(), fixed_delays(1.0, 1.0));
    thrasher.start().unwrap();
    let seed = thrasher.seed().unwrap();
    thrasher.stop();
    thrasher.join().await;
    assert_eq!(thrasher.summary().unwrap().seed, seed);
}
