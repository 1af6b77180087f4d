//! Validate a run file without touching any host.

use anyhow::{Context, Result};
use std::path::Path;
use thrash_core::{ThrashSettings, VerifierSettings};
use thrash_engine::Roster;

use crate::config::RunFile;

/// Run the validate command.
pub async fn run(path: &Path) -> Result<()> {
    let run_file = RunFile::from_file(path)?;

    println!("=== gw-thrash validate ===");
    println!();

    for role in &run_file.roles {
        let roster = Roster::from_provider(&run_file, role)
            .await
            .with_context(|| format!("Role {role}"))?;
        let settings = ThrashSettings::resolve(&run_file.thrasher, roster.len())
            .with_context(|| format!("Thrasher for role {role}"))?;

        println!("Role {role}:");
        println!("  Daemons:    {:?}", roster);
        println!("  Max thrash: {}", settings.max_thrash);
        println!(
            "  Quota:      {} per {}s",
            settings.quota.times,
            settings.quota.period.as_secs_f64()
        );
        println!(
            "  Delays:     thrash {}-{}s, revive {}-{}s",
            settings.thrash_delay.min().as_secs_f64(),
            settings.thrash_delay.max().as_secs_f64(),
            settings.revive_delay.min().as_secs_f64(),
            settings.revive_delay.max().as_secs_f64()
        );
    }

    let checks = run_file.health_checks()?;
    let verifier = VerifierSettings::resolve(&run_file.verifier, checks.len()).context("Verifier")?;
    let names: Vec<&str> = checks.iter().map(|c| c.name()).collect();
    println!("Verifier:");
    println!("  Checks:   {}", names.join(", "));
    println!("  Interval: {}s", verifier.check_interval.as_secs_f64());
    println!();
    println!("Run file OK");

    Ok(())
}
