//! Thrash and verify for a fixed duration.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::time::Duration;
use thrash_engine::{Roster, Thrasher, ThrasherRegistry, Verifier};
use uuid::Uuid;

use crate::config::RunFile;

/// Run the run command.
pub async fn run(path: &Path, duration: Option<u64>, seed: Option<u64>) -> Result<()> {
    let run_file = RunFile::from_file(path)?;
    let run_id = Uuid::new_v4();
    let duration = Duration::from_secs(duration.unwrap_or(run_file.duration));
    let checks = run_file.health_checks()?;

    let registry = ThrasherRegistry::new();
    let paired = run_file.roles.len() > 1;
    let mut thrashers = Vec::with_capacity(run_file.roles.len());
    for role in &run_file.roles {
        let roster = Roster::from_provider(&run_file, role)
            .await
            .with_context(|| format!("Role {role}"))?;

        let mut thrasher = Thrasher::new(role.clone(), roster, run_file.thrasher.clone());
        if let Some(seed) = seed {
            thrasher = thrasher.with_seed(seed);
        }
        for check in &checks {
            thrasher = thrasher.with_health_check(check.clone());
        }
        if paired {
            thrasher = thrasher.with_pause_handle(registry.register(&run_file.cluster, role));
        }
        thrashers.push(thrasher);
    }

    let mut verifier = Verifier::new("verifier", run_file.verifier.clone());
    for check in &checks {
        verifier = verifier.with_check(check.clone());
    }

    tracing::info!(
        %run_id,
        cluster = %run_file.cluster,
        roles = ?run_file.roles,
        duration_secs = duration.as_secs(),
        "starting thrash run"
    );

    for i in 0..thrashers.len() {
        if let Err(e) = thrashers[i].start() {
            let name = thrashers[i].name().to_string();
            shutdown(&mut thrashers[..i]).await;
            return Err(e).with_context(|| format!("Failed to start thrasher {name}"));
        }
    }
    if let Err(e) = verifier.start() {
        shutdown(&mut thrashers).await;
        return Err(e).context("Failed to start verifier");
    }

    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!(%run_id, "interrupted, stopping thrashers");
        }
    }

    verifier.stop();
    shutdown(&mut thrashers).await;
    verifier.join().await;

    println!("=== gw-thrash run {run_id} ===");
    println!();
    let mut failures = Vec::new();
    for thrasher in &thrashers {
        println!("Thrasher {}:", thrasher.name());
        if let Some(summary) = thrasher.summary() {
            println!("  Seed:        {}", summary.seed);
            println!("  Rounds:      {}", summary.rounds);
            println!("  Disruptions: {}", summary.total_disruptions());
            for (id, count) in &summary.per_daemon {
                println!("    {id}: {count}");
            }
        }
        match thrasher.failure() {
            Some(e) => {
                println!("  Failure:     {e}");
                failures.push(format!("thrasher {}: {e}", thrasher.name()));
            }
            None => println!("  Failure:     none"),
        }
    }

    println!("Verifier:");
    if let Some(summary) = verifier.summary() {
        println!("  Samples:     {}", summary.samples);
    }
    match verifier.failure() {
        Some(e) => {
            println!("  Failure:     {e}");
            failures.push(format!("verifier: {e}"));
        }
        None => println!("  Failure:     none"),
    }

    if !failures.is_empty() {
        bail!("Thrash run failed: {}", failures.join("; "));
    }
    Ok(())
}

/// Stop every thrasher, then wait for each to finish its in-flight revive.
async fn shutdown(thrashers: &mut [Thrasher]) {
    for thrasher in thrashers.iter() {
        thrasher.stop();
    }
    for thrasher in thrashers.iter_mut() {
        thrasher.join().await;
    }
}
