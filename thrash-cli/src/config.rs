//! Run file: what to thrash, how, and what to verify.
//!
//! ```toml
//! cluster = "ceph"
//! roles = ["nvmeof"]
//! duration = 600
//!
//! [thrasher]
//! max_thrash_daemons = 1
//! min_thrash_delay = 60
//!
//! [verifier]
//! check_interval = 10
//!
//! [[daemons]]
//! id = "nvmeof.a"
//! host = "gw1"
//! control = "systemd"
//! unit = "ceph-nvmeof@a.service"
//!
//! [[checks]]
//! name = "paths"
//! kind = "path"
//! host = "client1"
//! device = "/dev/nvme0n1"
//! ```

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thrash_engine::{Daemon, DaemonError, HealthCheck, RosterProvider};
use thrash_remote::{CommandCheck, OrchDaemon, PathStateCheck, SshTarget, SystemdDaemon};
use thrash_types::{ThrashConfig, VerifierConfig};

/// How a daemon is stopped and revived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// `systemctl` on the daemon's own host.
    Systemd,
    /// `ceph orch daemon` on an admin host.
    Orch,
}

/// One daemon in the fleet.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonSpec {
    /// Stable identity.
    pub id: String,
    /// Host the daemon runs on.
    pub host: String,
    /// SSH user.
    #[serde(default = "default_user")]
    pub user: String,
    /// Role the daemon belongs to.
    #[serde(default = "default_role")]
    pub role: String,
    /// Control method.
    #[serde(default = "default_control")]
    pub control: Control,
    /// systemd unit (systemd control).
    pub unit: Option<String>,
    /// Orchestrator daemon name (orch control).
    pub orch_name: Option<String>,
    /// Host the orchestrator CLI runs on (orch control).
    pub admin_host: Option<String>,
}

/// Kind of health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Status command that must exit zero.
    Command,
    /// `nvme list-subsys` path state on an initiator.
    Path,
}

/// One health check.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckSpec {
    /// Name used in logs and violations.
    pub name: String,
    /// Kind of check.
    pub kind: CheckKind,
    /// Host to run on.
    pub host: String,
    /// SSH user.
    #[serde(default = "default_user")]
    pub user: String,
    /// Command to run (command checks).
    pub command: Option<String>,
    /// Substring required in stdout (command checks).
    pub expect: Option<String>,
    /// Device or subsystem to inspect (path checks).
    pub device: Option<String>,
}

/// A complete run description.
#[derive(Debug, Clone, Deserialize)]
pub struct RunFile {
    /// Cluster name used to pair thrashers.
    #[serde(default = "default_cluster")]
    pub cluster: String,
    /// Roles to thrash; one thrasher per role.
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
    /// Run length in seconds.
    #[serde(default = "default_duration")]
    pub duration: u64,
    /// Thrasher tunables, shared by every role.
    #[serde(default)]
    pub thrasher: ThrashConfig,
    /// Verifier tunables.
    #[serde(default)]
    pub verifier: VerifierConfig,
    /// The fleet.
    #[serde(default)]
    pub daemons: Vec<DaemonSpec>,
    /// Health checks, run by the verifier and after each thrasher revive wait.
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

fn default_user() -> String {
    "root".to_string()
}

fn default_role() -> String {
    "nvmeof".to_string()
}

fn default_control() -> Control {
    Control::Systemd
}

fn default_cluster() -> String {
    "ceph".to_string()
}

fn default_roles() -> Vec<String> {
    vec![default_role()]
}

fn default_duration() -> u64 {
    300
}

impl RunFile {
    /// Parse a run file from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Invalid run file")
    }

    /// Load a run file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read run file {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    /// Build every configured health check.
    pub fn health_checks(&self) -> Result<Vec<Arc<dyn HealthCheck>>> {
        self.checks.iter().map(build_check).collect()
    }
}

fn build_check(spec: &CheckSpec) -> Result<Arc<dyn HealthCheck>> {
    let target = SshTarget::new(spec.host.clone(), spec.user.clone());
    match spec.kind {
        CheckKind::Command => {
            let Some(command) = &spec.command else {
                bail!("check {} is a command check without a command", spec.name);
            };
            let mut check = CommandCheck::new(spec.name.clone(), target, command.clone());
            if let Some(expect) = &spec.expect {
                check = check.expecting(expect.clone());
            }
            Ok(Arc::new(check))
        }
        CheckKind::Path => {
            let Some(device) = &spec.device else {
                bail!("check {} is a path check without a device", spec.name);
            };
            Ok(Arc::new(PathStateCheck::new(
                spec.name.clone(),
                target,
                device.clone(),
            )))
        }
    }
}

fn build_daemon(spec: &DaemonSpec) -> Result<Arc<dyn Daemon>, DaemonError> {
    let target = SshTarget::new(spec.host.clone(), spec.user.clone());
    match spec.control {
        Control::Systemd => {
            let unit = spec.unit.clone().ok_or_else(|| {
                DaemonError::Other(format!("daemon {} uses systemd but has no unit", spec.id))
            })?;
            Ok(Arc::new(SystemdDaemon::new(spec.id.as_str(), target, unit)))
        }
        Control::Orch => {
            let name = spec.orch_name.clone().ok_or_else(|| {
                DaemonError::Other(format!("daemon {} uses orch but has no orch_name", spec.id))
            })?;
            let admin = match &spec.admin_host {
                Some(admin) => SshTarget::new(admin.clone(), spec.user.clone()),
                None => target,
            };
            Ok(Arc::new(OrchDaemon::new(
                spec.id.as_str(),
                admin,
                name,
                spec.host.clone(),
            )))
        }
    }
}

#[async_trait]
impl RosterProvider for RunFile {
    async fn daemons(&self, role: &str) -> Result<Vec<Arc<dyn Daemon>>, DaemonError> {
        self.daemons
            .iter()
            .filter(|d| d.role == role)
            .map(build_daemon)
            .collect()
    }
}
