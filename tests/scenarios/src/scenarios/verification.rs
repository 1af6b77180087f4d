//! Verifier running alongside a thrasher.

use std::sync::Arc;
use std::time::Duration;
use thrash_engine::mock::{MockFleet, MockHealthCheck};
use thrash_engine::{RunState, ThrashConfig, ThrashError, Thrasher, Verifier, VerifierConfig};

fn quick() -> ThrashConfig {
    ThrashConfig {
        min_thrash_delay: 1.0,
        max_thrash_delay: Some(2.0),
        min_revive_delay: 2.0,
        max_revive_delay: Some(4.0),
        daemon_max_thrash_times: 100,
        seed: Some(99),
        ..ThrashConfig::default()
    }
}

/// With at most n-1 gateways down, the initiator always has a path.
#[tokio::test(start_paused = true)]
async fn path_check_holds_during_thrash() {
    let fleet = MockFleet::new();
    let mut thrasher = Thrasher::new("nvmeof", fleet.roster(&["gw.a", "gw.b", "gw.c"]).unwrap(), quick())
        .with_health_check(Arc::new(fleet.path_check("paths")));
    let mut verifier = Verifier::new(
        "paths",
        VerifierConfig {
            check_interval: 0.5,
        },
    )
    .with_check(Arc::new(fleet.path_check("paths")));

    thrasher.start().unwrap();
    verifier.start().unwrap();
    tokio::time::sleep(Duration::from_secs(900)).await;
    thrasher.stop();
    verifier.stop();
    thrasher.join().await;
    verifier.join().await;

    assert!(thrasher.failure().is_none());
    assert!(verifier.failure().is_none());
    assert!(verifier.summary().unwrap().samples > 1000);
    assert!(fleet.peak_down() >= 1);
}

/// A verifier violation is captured without stopping the thrasher.
#[tokio::test(start_paused = true)]
async fn violation_does_not_stop_thrasher() {
    let fleet = MockFleet::new();
    let check = MockHealthCheck::healthy("io");
    check.fail_after(5, "write latency above threshold");

    let mut thrasher = Thrasher::new("nvmeof", fleet.roster(&["gw.a", "gw.b"]).unwrap(), quick());
    let mut verifier = Verifier::new("io", VerifierConfig { check_interval: 1.0 })
        .with_check(Arc::new(check.clone()));

    thrasher.start().unwrap();
    verifier.start().unwrap();
    verifier.join().await;

    match verifier.failure() {
        Some(ThrashError::HealthViolation { check, detail }) => {
            assert_eq!(check, "io");
            assert_eq!(detail, "write latency above threshold");
        }
        other => panic!("expected HealthViolation, got {other:?}"),
    }
    assert_eq!(check.calls(), 6);
    assert_eq!(thrasher.state(), RunState::Running);

    thrasher.stop();
    thrasher.join().await;
    assert!(thrasher.failure().is_none());
    assert_eq!(fleet.down_count(), 0);
}
