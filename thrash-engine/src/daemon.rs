//! Disruptable daemons and the roster.
//!
//! The thrasher only holds references to daemons. Creating, deploying,
//! and tearing them down belongs to whoever built the roster.

use crate::error::{DaemonError, ThrashError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thrash_types::{ConfigError, DaemonId};

/// A long-running service that can be stopped and revived.
///
/// All operations are idempotent with respect to the daemon's observable
/// running/stopped state: stopping a stopped daemon or restarting a running
/// one is not an error.
#[async_trait]
pub trait Daemon: Send + Sync + fmt::Debug {
    /// Stable identity.
    fn id(&self) -> &DaemonId;

    /// Host the daemon runs on.
    fn host(&self) -> &str;

    /// Stop the daemon gracefully.
    async fn stop(&self) -> Result<(), DaemonError>;

    /// Kill the daemon immediately.
    ///
    /// Defaults to [`Daemon::stop`] for daemons without a harsher method.
    async fn kill(&self) -> Result<(), DaemonError> {
        self.stop().await
    }

    /// Start a stopped daemon.
    async fn start(&self) -> Result<(), DaemonError>;

    /// Restart the daemon, starting it if stopped.
    async fn restart(&self) -> Result<(), DaemonError>;
}

/// Source of daemon handles for a role, queried once per run.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// All daemons of `role`.
    async fn daemons(&self, role: &str) -> Result<Vec<Arc<dyn Daemon>>, DaemonError>;
}

/// Ordered, immutable set of daemons for one run.
///
/// Always holds at least two daemons with distinct identities.
#[derive(Clone)]
pub struct Roster {
    daemons: Arc<[Arc<dyn Daemon>]>,
}

impl Roster {
    /// Build a roster.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RosterTooSmall`] for fewer than two daemons and
    /// [`ConfigError::DuplicateDaemon`] if an identity repeats.
    pub fn new(daemons: Vec<Arc<dyn Daemon>>) -> Result<Self, ConfigError> {
        if daemons.len() < 2 {
            return Err(ConfigError::RosterTooSmall {
                size: daemons.len(),
            });
        }

        let mut seen = HashSet::new();
        for d in &daemons {
            if !seen.insert(d.id().clone()) {
                return Err(ConfigError::DuplicateDaemon {
                    id: d.id().to_string(),
                });
            }
        }

        Ok(Self {
            daemons: daemons.into(),
        })
    }

    /// Build a roster from every daemon `provider` reports for `role`.
    pub async fn from_provider(
        provider: &dyn RosterProvider,
        role: &str,
    ) -> Result<Self, ThrashError> {
        let daemons = provider.daemons(role).await.map_err(ThrashError::Roster)?;
        tracing::info!(role, count = daemons.len(), "roster loaded");
        Ok(Self::new(daemons)?)
    }

    /// Number of daemons.
    pub fn len(&self) -> usize {
        self.daemons.len()
    }

    /// Whether the roster has no daemons.
    pub fn is_empty(&self) -> bool {
        self.daemons.is_empty()
    }

    /// Daemon at roster position `index`.
    pub fn get(&self, index: usize) -> Option<&Arc<dyn Daemon>> {
        self.daemons.get(index)
    }

    /// Iterate in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Daemon>> {
        self.daemons.iter()
    }

    /// Identities in roster order.
    pub fn ids(&self) -> Vec<DaemonId> {
        self.daemons.iter().map(|d| d.id().clone()).collect()
    }
}

impl fmt::Debug for Roster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.daemons.iter().map(|d| d.id()))
            .finish()
    }
}
