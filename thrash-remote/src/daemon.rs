//! Daemon control over SSH.

use crate::ssh::{SshError, SshTarget};
use async_trait::async_trait;
use thrash_engine::{Daemon, DaemonError};
use thrash_types::DaemonId;

fn daemon_error(id: &DaemonId, command: &str, err: SshError) -> DaemonError {
    if err.is_unreachable() {
        return DaemonError::Unreachable {
            daemon: id.to_string(),
            detail: err.to_string(),
        };
    }
    let detail = match err {
        SshError::CommandFailed {
            exit_code, stderr, ..
        } => format!("exit={exit_code}: {stderr}"),
        other => other.to_string(),
    };
    DaemonError::CommandFailed {
        daemon: id.to_string(),
        command: command.to_string(),
        detail,
    }
}

async fn run(target: &SshTarget, id: &DaemonId, command: String) -> Result<(), DaemonError> {
    tracing::debug!(daemon = %id, host = %target.host, command = %command, "daemon control");
    target
        .exec_ok(&command)
        .await
        .map(|_| ())
        .map_err(|e| daemon_error(id, &command, e))
}

// ============================================================================
// systemd
// ============================================================================

/// A daemon controlled through its systemd unit on the host it runs on.
#[derive(Debug, Clone)]
pub struct SystemdDaemon {
    id: DaemonId,
    target: SshTarget,
    unit: String,
    sudo: bool,
}

impl SystemdDaemon {
    /// Control `unit` on `target`, running systemctl with sudo.
    pub fn new(id: impl Into<DaemonId>, target: SshTarget, unit: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target,
            unit: unit.into(),
            sudo: true,
        }
    }

    /// Run systemctl without sudo.
    pub fn without_sudo(mut self) -> Self {
        self.sudo = false;
        self
    }

    /// Unit name.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Full command line for a systemctl `verb`.
    pub fn command(&self, verb: &str) -> String {
        let prefix = if self.sudo { "sudo " } else { "" };
        format!("{prefix}systemctl {verb} {}", self.unit)
    }
}

#[async_trait]
impl Daemon for SystemdDaemon {
    fn id(&self) -> &DaemonId {
        &self.id
    }

    fn host(&self) -> &str {
        &self.target.host
    }

    async fn stop(&self) -> Result<(), DaemonError> {
        run(&self.target, &self.id, self.command("stop")).await
    }

    async fn kill(&self) -> Result<(), DaemonError> {
        run(&self.target, &self.id, self.command("kill -s KILL")).await
    }

    async fn start(&self) -> Result<(), DaemonError> {
        run(&self.target, &self.id, self.command("start")).await
    }

    async fn restart(&self) -> Result<(), DaemonError> {
        run(&self.target, &self.id, self.command("restart")).await
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// A daemon controlled through `ceph orch daemon` on an admin host.
#[derive(Debug, Clone)]
pub struct OrchDaemon {
    id: DaemonId,
    admin: SshTarget,
    name: String,
    host: String,
}

impl OrchDaemon {
    /// Control orchestrator daemon `name`, which runs on `host`, from `admin`.
    pub fn new(
        id: impl Into<DaemonId>,
        admin: SshTarget,
        name: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            admin,
            name: name.into(),
            host: host.into(),
        }
    }

    /// Orchestrator daemon name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full command line for an orchestrator `verb`.
    pub fn command(&self, verb: &str) -> String {
        format!("sudo ceph orch daemon {verb} {}", self.name)
    }
}

#[async_trait]
impl Daemon for OrchDaemon {
    fn id(&self) -> &DaemonId {
        &self.id
    }

    fn host(&self) -> &str {
        &self.host
    }

    async fn stop(&self) -> Result<(), DaemonError> {
        run(&self.admin, &self.id, self.command("stop")).await
    }

    async fn start(&self) -> Result<(), DaemonError> {
        run(&self.admin, &self.id, self.command("start")).await
    }

    async fn restart(&self) -> Result<(), DaemonError> {
        run(&self.admin, &self.id, self.command("restart")).await
    }
}
