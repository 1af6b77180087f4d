//! Worked examples: quota exhaustion and a failing stop.

use crate::assertions::assert_all_revived;
use std::time::Duration;
use thrash_engine::mock::MockFleet;
use thrash_engine::{DaemonOp, RunState, ThrashConfig, ThrashError, Thrasher};

fn zero_delay_single_quota() -> ThrashConfig {
    ThrashConfig {
        max_thrash: Some(1),
        daemon_max_thrash_times: 1,
        daemon_max_thrash_period: 3600.0,
        min_thrash_delay: 0.0,
        max_thrash_delay: Some(0.0),
        min_revive_delay: 0.0,
        max_revive_delay: Some(0.0),
        ..ThrashConfig::default()
    }
    .deterministic(42)
}

/// Roster [A,B,C], one disruption per daemon per hour, no delays: exactly
/// three productive rounds, then empty rounds until stopped.
///
/// Runs on the real clock; with zero delays the paused clock never idles.
#[tokio::test]
async fn three_gateways_exhaust_quota() {
    let fleet = MockFleet::new();
    let mut thrasher = Thrasher::new(
        "gateways",
        fleet.roster(&["A", "B", "C"]).unwrap(),
        zero_delay_single_quota(),
    );

    thrasher.start().unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    thrasher.stop();
    thrasher.join().await;

    assert!(thrasher.failure().is_none(), "{:?}", thrasher.failure());
    let summary = thrasher.summary().unwrap();
    assert_eq!(summary.disruptions.len(), 3);
    assert!(summary.rounds > summary.disruptions.len() as u64);
    for report in &summary.disruptions {
        assert_eq!(report.victims.len(), 1);
    }
    // Every daemon reached its quota, so every later round was empty.
    for id in ["A", "B", "C"] {
        assert_eq!(fleet.stops_of(id), 1, "{id} stopped {} times", fleet.stops_of(id));
        assert_eq!(fleet.restarts_of(id), 1);
    }
    assert_all_revived(&fleet.events()).assert_passed();
}

/// B's stop fails: the failure is captured, the round's victims are
/// revived, and no further rounds run.
#[tokio::test(start_paused = true)]
async fn failing_stop_ends_run() {
    let fleet = MockFleet::new();
    let roster = fleet.roster(&["A", "B", "C"]).unwrap();
    fleet.fail_stops("B", "Failed to stop unit: Access denied");
    let config = ThrashConfig {
        max_thrash: Some(2),
        min_thrash_delay: 1.0,
        max_thrash_delay: Some(1.0),
        min_revive_delay: 1.0,
        max_revive_delay: Some(1.0),
        ..ThrashConfig::default()
    }
    .deterministic(42);
    let mut thrasher = Thrasher::new("gateways", roster, config);

    thrasher.start().unwrap();
    // Ends on its own once B is chosen.
    tokio::time::timeout(Duration::from_secs(24 * 3600), thrasher.join())
        .await
        .expect("thrasher should stop after B fails");

    match thrasher.failure() {
        Some(ThrashError::DaemonOperation { daemon, op, .. }) => {
            assert_eq!(daemon.as_str(), "B");
            assert_eq!(*op, DaemonOp::Stop);
        }
        other => panic!("expected DaemonOperation, got {other:?}"),
    }
    assert_eq!(thrasher.state(), RunState::Stopped);
    assert_eq!(fleet.down_count(), 0);
    assert_all_revived(&fleet.events()).assert_passed();

    // Nothing happens after the loop ends.
    let events = fleet.events().len();
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(fleet.events().len(), events);

    // B was never taken down, so it is never counted as disrupted.
    let summary = thrasher.summary().unwrap();
    assert_eq!(fleet.stops_of("B"), 0);
    assert!(summary
        .disruptions
        .iter()
        .all(|r| r.victims.iter().all(|id| id.as_str() != "B")));
    let stops: usize = ["A", "B", "C"].iter().map(|id| fleet.stops_of(id)).sum();
    assert_eq!(summary.total_disruptions(), stops);
}
