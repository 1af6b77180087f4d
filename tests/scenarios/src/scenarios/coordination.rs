//! Paired thrashers over related subsystems.

use crate::assertions::{assert_all_revived, assert_disjoint_windows};
use std::time::Duration;
use thrash_engine::mock::MockFleet;
use thrash_engine::{ThrashConfig, Thrasher, ThrasherRegistry};

fn config(seed: u64, revive: f64) -> ThrashConfig {
    ThrashConfig {
        daemon_max_thrash_times: 50,
        min_thrash_delay: 1.0,
        max_thrash_delay: Some(1.0),
        min_revive_delay: revive,
        max_revive_delay: Some(revive),
        ..ThrashConfig::default()
    }
    .deterministic(seed)
}

/// Gateway and storage thrashers registered under one cluster never have
/// daemons down at the same time, and both keep making progress.
#[tokio::test(start_paused = true)]
async fn paired_thrashers_never_overlap() {
    let fleet = MockFleet::new();
    let registry = ThrasherRegistry::new();

    let mut gateways = Thrasher::new(
        "nvmeof",
        fleet.roster(&["gw.a", "gw.b", "gw.c"]).unwrap(),
        config(1, 5.0),
    )
    .with_pause_handle(registry.register("ceph", "nvmeof"));
    let mut storage = Thrasher::new(
        "osd",
        fleet.roster(&["osd.0", "osd.1", "osd.2", "osd.3"]).unwrap(),
        config(2, 3.0),
    )
    .with_pause_handle(registry.register("ceph", "osd"));

    assert_eq!(registry.members("ceph"), vec!["nvmeof", "osd"]);

    gateways.start().unwrap();
    storage.start().unwrap();
    tokio::time::sleep(Duration::from_secs(1800)).await;
    gateways.stop();
    storage.stop();
    gateways.join().await;
    storage.join().await;

    assert!(gateways.failure().is_none(), "{:?}", gateways.failure());
    assert!(storage.failure().is_none(), "{:?}", storage.failure());

    assert_disjoint_windows(&fleet.down_history(), "gw.", "osd.").assert_passed();
    assert_all_revived(&fleet.events()).assert_passed();
    assert!(gateways.summary().unwrap().disruptions.len() > 10);
    assert!(storage.summary().unwrap().disruptions.len() > 10);

    // Exited thrashers leave the registry.
    assert!(registry.members("ceph").is_empty());
}

/// A lone registered thrasher is unaffected by the handoff.
#[tokio::test(start_paused = true)]
async fn lone_registered_thrasher_runs_normally() {
    let fleet = MockFleet::new();
    let registry = ThrasherRegistry::new();
    let mut gateways = Thrasher::new(
        "nvmeof",
        fleet.roster(&["gw.a", "gw.b"]).unwrap(),
        config(3, 2.0),
    )
    .with_pause_handle(registry.register("ceph", "nvmeof"));

    gateways.start().unwrap();
    tokio::time::sleep(Duration::from_secs(300)).await;
    gateways.stop();
    gateways.join().await;

    assert!(gateways.failure().is_none());
    assert!(!gateways.summary().unwrap().disruptions.is_empty());
    assert_eq!(fleet.down_count(), 0);
}

/// When one thrasher fails and exits, its sibling is never left waiting.
#[tokio::test(start_paused = true)]
async fn sibling_exit_releases_partner() {
    let fleet = MockFleet::new();
    let registry = ThrasherRegistry::new();

    let gw_roster = fleet.roster(&["gw.a", "gw.b"]).unwrap();
    fleet.fail_stops("gw.a", "ssh: connect to host gw1: Connection refused");
    fleet.fail_stops("gw.b", "ssh: connect to host gw2: Connection refused");
    let mut gateways = Thrasher::new("nvmeof", gw_roster, config(4, 2.0))
        .with_pause_handle(registry.register("ceph", "nvmeof"));
    let mut storage = Thrasher::new(
        "osd",
        fleet.roster(&["osd.0", "osd.1"]).unwrap(),
        config(5, 2.0),
    )
    .with_pause_handle(registry.register("ceph", "osd"));

    gateways.start().unwrap();
    storage.start().unwrap();
    gateways.join().await;
    assert!(gateways.failure().is_some());
    assert_eq!(registry.members("ceph"), vec!["osd"]);

    let before = storage_rounds(&fleet);
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert!(storage_rounds(&fleet) > before);

    storage.stop();
    storage.join().await;
    assert!(storage.failure().is_none());
    assert_eq!(fleet.down_count(), 0);
}

fn storage_rounds(fleet: &MockFleet) -> usize {
    fleet.restarts_of("osd.0") + fleet.restarts_of("osd.1")
}
