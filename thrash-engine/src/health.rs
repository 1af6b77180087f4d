//! Health check capability.

use crate::error::HealthError;
use async_trait::async_trait;

/// Result of one read-only status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    /// Whether the predicate held.
    pub healthy: bool,
    /// Diagnostic text (command output, parsed path states).
    pub detail: String,
}

impl HealthStatus {
    /// A passing sample.
    pub fn healthy(detail: impl Into<String>) -> Self {
        Self {
            healthy: true,
            detail: detail.into(),
        }
    }

    /// A failing sample.
    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            healthy: false,
            detail: detail.into(),
        }
    }
}

/// A read-only query of cluster or data-path health.
#[async_trait]
pub trait HealthCheck: Send + Sync + std::fmt::Debug {
    /// Name used in logs and in captured violations.
    fn name(&self) -> &str;

    /// Run the query once.
    ///
    /// `Err` means the query itself could not run; an unhealthy but
    /// successfully-run query returns `Ok` with `healthy == false`.
    async fn check(&self) -> Result<HealthStatus, HealthError>;
}
