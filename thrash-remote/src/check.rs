//! Health checks over SSH.

use crate::paths::parse_list_subsys;
use crate::ssh::{SshError, SshTarget};
use async_trait::async_trait;
use thrash_engine::{HealthCheck, HealthError, HealthStatus};

fn unavailable(check: &str, err: SshError) -> HealthError {
    HealthError::Unavailable {
        check: check.to_string(),
        detail: err.to_string(),
    }
}

/// Healthy while a read-only status command exits zero.
///
/// With an expected substring set, stdout must also contain it.
#[derive(Debug, Clone)]
pub struct CommandCheck {
    name: String,
    target: SshTarget,
    command: String,
    expect: Option<String>,
}

impl CommandCheck {
    /// Run `command` on `target`.
    pub fn new(name: impl Into<String>, target: SshTarget, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target,
            command: command.into(),
            expect: None,
        }
    }

    /// Also require `needle` in stdout.
    pub fn expecting(mut self, needle: impl Into<String>) -> Self {
        self.expect = Some(needle.into());
        self
    }

    /// Command line being run.
    pub fn command(&self) -> &str {
        &self.command
    }

    fn judge(&self, exit_code: i32, stdout: &str, stderr: &str) -> HealthStatus {
        if exit_code != 0 {
            return HealthStatus::unhealthy(format!("exit={exit_code}: {}", stderr.trim()));
        }
        match &self.expect {
            Some(needle) if !stdout.contains(needle.as_str()) => {
                HealthStatus::unhealthy(format!("output lacks {needle:?}: {}", stdout.trim()))
            }
            _ => HealthStatus::healthy(stdout.trim()),
        }
    }
}

#[async_trait]
impl HealthCheck for CommandCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<HealthStatus, HealthError> {
        let result = self
            .target
            .exec(&self.command)
            .await
            .map_err(|e| unavailable(&self.name, e))?;
        if result.exit_code == crate::ssh::SSH_CONNECT_FAILURE {
            return Err(HealthError::Unavailable {
                check: self.name.clone(),
                detail: result.stderr.trim().to_string(),
            });
        }
        Ok(self.judge(result.exit_code, &result.stdout, &result.stderr))
    }
}

/// Healthy while an initiator sees a live optimized path to a subsystem.
#[derive(Debug, Clone)]
pub struct PathStateCheck {
    name: String,
    initiator: SshTarget,
    device: String,
}

impl PathStateCheck {
    /// Inspect `device` (namespace or subsystem) from `initiator`.
    pub fn new(name: impl Into<String>, initiator: SshTarget, device: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initiator,
            device: device.into(),
        }
    }

    /// Command line being run.
    pub fn command(&self) -> String {
        format!("sudo nvme list-subsys {}", self.device)
    }
}

#[async_trait]
impl HealthCheck for PathStateCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<HealthStatus, HealthError> {
        let result = self
            .initiator
            .exec_ok(&self.command())
            .await
            .map_err(|e| unavailable(&self.name, e))?;

        let summary = parse_list_subsys(&result.stdout);
        let detail = format!("{}: {}", self.device, summary.describe());
        if summary.is_healthy() {
            Ok(HealthStatus::healthy(detail))
        } else {
            Ok(HealthStatus::unhealthy(detail))
        }
    }
}
