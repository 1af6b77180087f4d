//! In-memory daemons and health checks for testing.
//!
//! A [`MockFleet`] is a shared ledger of daemon state. Every
//! [`MockDaemon`] it hands out records its operations in that ledger, so a
//! test can inspect the event order, the set of daemons currently down,
//! and the largest number that were ever down at once.

use crate::daemon::{Daemon, Roster};
use crate::error::{DaemonError, HealthError};
use crate::health::{HealthCheck, HealthStatus};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use thrash_types::{ConfigError, DaemonId};

/// One operation applied to a mock daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEvent {
    /// Graceful stop.
    Stopped(DaemonId),
    /// Kill.
    Killed(DaemonId),
    /// Start.
    Started(DaemonId),
    /// Restart.
    Restarted(DaemonId),
}

impl DaemonEvent {
    /// Daemon the event applies to.
    pub fn id(&self) -> &DaemonId {
        match self {
            DaemonEvent::Stopped(id)
            | DaemonEvent::Killed(id)
            | DaemonEvent::Started(id)
            | DaemonEvent::Restarted(id) => id,
        }
    }

    /// Returns true for events that take a daemon down.
    pub fn is_down(&self) -> bool {
        matches!(self, DaemonEvent::Stopped(_) | DaemonEvent::Killed(_))
    }
}

#[derive(Debug, Default)]
struct FleetLedger {
    members: BTreeSet<DaemonId>,
    events: Vec<DaemonEvent>,
    down: BTreeSet<DaemonId>,
    down_history: Vec<BTreeSet<DaemonId>>,
    peak_down: usize,
    fail_next_stop: HashMap<DaemonId, String>,
    fail_stops: HashMap<DaemonId, String>,
    fail_next_restart: HashMap<DaemonId, String>,
}

impl FleetLedger {
    fn apply(&mut self, event: DaemonEvent) {
        let id = event.id().clone();
        if event.is_down() {
            self.down.insert(id);
        } else {
            self.down.remove(&id);
        }
        self.events.push(event);
        self.peak_down = self.peak_down.max(self.down.len());
        self.down_history.push(self.down.clone());
    }

    fn take_stop_failure(&mut self, id: &DaemonId) -> Option<String> {
        self.fail_next_stop
            .remove(id)
            .or_else(|| self.fail_stops.get(id).cloned())
    }
}

/// Shared state for a set of mock daemons.
#[derive(Debug, Clone, Default)]
pub struct MockFleet {
    inner: Arc<Mutex<FleetLedger>>,
}

impl MockFleet {
    /// Create an empty fleet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a daemon handle backed by this fleet. The daemon starts up.
    pub fn daemon(&self, id: &str) -> MockDaemon {
        let id = DaemonId::from(id);
        self.inner.lock().unwrap().members.insert(id.clone());
        MockDaemon {
            id,
            host: "mock".to_string(),
            fleet: self.clone(),
        }
    }

    /// Build a roster of fresh daemons with the given ids, in order.
    pub fn roster(&self, ids: &[&str]) -> Result<Roster, ConfigError> {
        let daemons: Vec<Arc<dyn Daemon>> = ids
            .iter()
            .map(|id| Arc::new(self.daemon(id)) as Arc<dyn Daemon>)
            .collect();
        Roster::new(daemons)
    }

    /// Every operation applied so far, in order.
    pub fn events(&self) -> Vec<DaemonEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Daemons currently down.
    pub fn down(&self) -> BTreeSet<DaemonId> {
        self.inner.lock().unwrap().down.clone()
    }

    /// Number of daemons currently down.
    pub fn down_count(&self) -> usize {
        self.inner.lock().unwrap().down.len()
    }

    /// Largest number of daemons down at once.
    pub fn peak_down(&self) -> usize {
        self.inner.lock().unwrap().peak_down
    }

    /// The down set after each event.
    pub fn down_history(&self) -> Vec<BTreeSet<DaemonId>> {
        self.inner.lock().unwrap().down_history.clone()
    }

    /// Number of stop or kill operations applied to `id`.
    pub fn stops_of(&self, id: &str) -> usize {
        self.count(id, DaemonEvent::is_down)
    }

    /// Number of restart operations applied to `id`.
    pub fn restarts_of(&self, id: &str) -> usize {
        self.count(id, |e| matches!(e, DaemonEvent::Restarted(_)))
    }

    fn count(&self, id: &str, pred: impl Fn(&DaemonEvent) -> bool) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .events
            .iter()
            .filter(|e| e.id().as_str() == id && pred(e))
            .count()
    }

    /// Cause the next stop or kill of `id` to fail.
    pub fn fail_next_stop(&self, id: &str, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .fail_next_stop
            .insert(DaemonId::from(id), error.to_string());
    }

    /// Cause every stop or kill of `id` to fail.
    pub fn fail_stops(&self, id: &str, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_stops.insert(DaemonId::from(id), error.to_string());
    }

    /// Cause the next restart of `id` to fail.
    pub fn fail_next_restart(&self, id: &str, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .fail_next_restart
            .insert(DaemonId::from(id), error.to_string());
    }

    /// A health check that passes while at least one fleet member is up,
    /// standing in for "the initiator still has a live path".
    pub fn path_check(&self, name: &str) -> FleetPathCheck {
        FleetPathCheck {
            name: name.to_string(),
            fleet: self.clone(),
        }
    }

    fn stop_like(&self, id: &DaemonId, event: DaemonEvent) -> Result<(), DaemonError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(detail) = inner.take_stop_failure(id) {
            return Err(DaemonError::CommandFailed {
                daemon: id.to_string(),
                command: "stop".to_string(),
                detail,
            });
        }
        inner.apply(event);
        Ok(())
    }
}

/// A daemon whose state lives in a [`MockFleet`].
#[derive(Debug, Clone)]
pub struct MockDaemon {
    id: DaemonId,
    host: String,
    fleet: MockFleet,
}

#[async_trait]
impl Daemon for MockDaemon {
    fn id(&self) -> &DaemonId {
        &self.id
    }

    fn host(&self) -> &str {
        &self.host
    }

    async fn stop(&self) -> Result<(), DaemonError> {
        self.fleet
            .stop_like(&self.id, DaemonEvent::Stopped(self.id.clone()))
    }

    async fn kill(&self) -> Result<(), DaemonError> {
        self.fleet
            .stop_like(&self.id, DaemonEvent::Killed(self.id.clone()))
    }

    async fn start(&self) -> Result<(), DaemonError> {
        let mut inner = self.fleet.inner.lock().unwrap();
        inner.apply(DaemonEvent::Started(self.id.clone()));
        Ok(())
    }

    async fn restart(&self) -> Result<(), DaemonError> {
        let mut inner = self.fleet.inner.lock().unwrap();
        if let Some(detail) = inner.fail_next_restart.remove(&self.id) {
            return Err(DaemonError::CommandFailed {
                daemon: self.id.to_string(),
                command: "restart".to_string(),
                detail,
            });
        }
        inner.apply(DaemonEvent::Restarted(self.id.clone()));
        Ok(())
    }
}

/// Health check over a [`MockFleet`]: healthy while any member is up.
#[derive(Debug, Clone)]
pub struct FleetPathCheck {
    name: String,
    fleet: MockFleet,
}

#[async_trait]
impl HealthCheck for FleetPathCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<HealthStatus, HealthError> {
        let inner = self.fleet.inner.lock().unwrap();
        let up = inner.members.len() - inner.down.len();
        let detail = format!("{up}/{} up", inner.members.len());
        if up > 0 {
            Ok(HealthStatus::healthy(detail))
        } else {
            Ok(HealthStatus::unhealthy(detail))
        }
    }
}

#[derive(Debug, Default)]
struct MockCheckInner {
    calls: u64,
    unhealthy_after: Option<(u64, String)>,
    error_next: Option<String>,
}

/// Scriptable health check.
///
/// Healthy until told otherwise.
#[derive(Debug, Clone)]
pub struct MockHealthCheck {
    name: String,
    inner: Arc<Mutex<MockCheckInner>>,
}

impl MockHealthCheck {
    /// Create an always-healthy check.
    pub fn healthy(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inner: Arc::default(),
        }
    }

    /// Report unhealthy from call number `calls + 1` onwards.
    pub fn fail_after(&self, calls: u64, detail: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.unhealthy_after = Some((calls, detail.to_string()));
    }

    /// Cause the next call to return [`HealthError::Unavailable`].
    pub fn error_next(&self, detail: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.error_next = Some(detail.to_string());
    }

    /// Number of times the check ran.
    pub fn calls(&self) -> u64 {
        self.inner.lock().unwrap().calls
    }
}

#[async_trait]
impl HealthCheck for MockHealthCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<HealthStatus, HealthError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;

        if let Some(detail) = inner.error_next.take() {
            return Err(HealthError::Unavailable {
                check: self.name.clone(),
                detail,
            });
        }

        match &inner.unhealthy_after {
            Some((after, detail)) if inner.calls > *after => {
                Ok(HealthStatus::unhealthy(detail.clone()))
            }
            _ => Ok(HealthStatus::healthy("ok")),
        }
    }
}
