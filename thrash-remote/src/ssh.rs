//! SSH execution primitives.
//!
//! Uses `tokio::process::Command` to shell out to `ssh`. Authentication is
//! key-based and must be configured ahead of time.

use thiserror::Error;

/// Exit status `ssh` itself reports when the connection fails.
pub const SSH_CONNECT_FAILURE: i32 = 255;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Errors from SSH operations.
#[derive(Debug, Error)]
pub enum SshError {
    /// SSH command failed to execute (process spawn error).
    #[error("ssh spawn error: {0}")]
    Spawn(#[from] std::io::Error),

    /// SSH command returned non-zero exit code.
    #[error("ssh command failed on {host}: exit={exit_code}, stderr={stderr}")]
    CommandFailed {
        /// Target host.
        host: String,
        /// Exit code.
        exit_code: i32,
        /// Standard error output.
        stderr: String,
    },
}

impl SshError {
    /// Returns true if the remote host was never reached.
    pub fn is_unreachable(&self) -> bool {
        match self {
            SshError::Spawn(_) => true,
            SshError::CommandFailed { exit_code, .. } => *exit_code == SSH_CONNECT_FAILURE,
        }
    }
}

/// Result of executing a command via SSH.
#[derive(Debug, Clone)]
pub struct SshResult {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Exit code (0 = success).
    pub exit_code: i32,
}

impl SshResult {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A host reachable over SSH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    /// Hostname or IP address.
    pub host: String,
    /// SSH username.
    pub user: String,
    /// Connect timeout in seconds.
    pub connect_timeout: u64,
}

impl SshTarget {
    /// Create a target with the default connect timeout.
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Override the connect timeout.
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout = secs;
        self
    }

    /// `user@host` destination string.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Arguments passed to `ssh` for `cmd`.
    pub fn ssh_args(&self, cmd: &str) -> Vec<String> {
        vec![
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            self.destination(),
            cmd.to_string(),
        ]
    }

    /// Execute a command on the remote machine via SSH.
    ///
    /// Returns the raw result including exit code, stdout, and stderr.
    /// Does NOT fail on non-zero exit. Use `exec_ok` for that.
    pub async fn exec(&self, cmd: &str) -> Result<SshResult, SshError> {
        tracing::debug!(host = %self.host, cmd, "ssh exec");
        let output = tokio::process::Command::new("ssh")
            .args(self.ssh_args(cmd))
            .output()
            .await?;

        Ok(SshResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Execute a command on the remote machine, failing on non-zero exit.
    pub async fn exec_ok(&self, cmd: &str) -> Result<SshResult, SshError> {
        let result = self.exec(cmd).await?;
        if !result.success() {
            return Err(SshError::CommandFailed {
                host: self.host.clone(),
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(result)
    }
}
