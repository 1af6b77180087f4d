//! Coordination between thrashers over related subsystems.
//!
//! When one thrasher disrupts gateways and another disrupts the storage
//! daemons behind them, their disruption windows must never overlap.
//! Thrashers register under a cluster name in a [`ThrasherRegistry`] and
//! receive a [`PauseHandle`], which provides:
//!
//! - **Turn**: a per-cluster async mutex. A thrasher holds the
//!   [`TurnGuard`] from victim selection until every victim of the round is
//!   restarted, so at most one registered thrasher has daemons down.
//! - **Handoff**: after its revive wait, a thrasher raises its paused
//!   signal and blocks until a sibling acknowledges it. A sibling
//!   acknowledges by reaching its own handoff (rendezvous, both signals
//!   cleared) or by passing a round [`checkpoint`](PauseHandle::checkpoint),
//!   which also happens continuously while it waits for the turn. With no
//!   active sibling the handoff is a no-op.
//!
//! Every wait also ends on stop, so a stop request is never deferred past
//! the in-flight revive.

use crate::lifecycle::StopSignal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Notify, OwnedMutexGuard};

/// How a handoff ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    /// No other thrasher is registered for the cluster.
    NoSibling,
    /// A sibling was already paused; both signals were cleared.
    Rendezvous,
    /// A sibling cleared our paused signal.
    Acknowledged,
    /// Stop was requested while paused.
    Stopped,
}

/// Exclusive right to disrupt daemons in a cluster.
#[derive(Debug)]
pub struct TurnGuard {
    _guard: OwnedMutexGuard<()>,
}

#[derive(Debug)]
struct Member {
    key: u64,
    name: String,
    paused: bool,
}

#[derive(Debug, Default)]
struct ClusterSlot {
    turn: Arc<tokio::sync::Mutex<()>>,
    members: Mutex<Vec<Member>>,
    changed: Notify,
}

impl ClusterSlot {
    fn members(&self) -> MutexGuard<'_, Vec<Member>> {
        // A poisoned lock only means a panicking holder; the flags are still coherent.
        self.members.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Explicit registry of thrashers keyed by cluster name.
///
/// Cloning shares the same registry.
#[derive(Debug, Clone, Default)]
pub struct ThrasherRegistry {
    clusters: Arc<Mutex<HashMap<String, Arc<ClusterSlot>>>>,
    next_key: Arc<AtomicU64>,
}

impl ThrasherRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a thrasher named `thrasher` under `cluster`.
    pub fn register(&self, cluster: &str, thrasher: &str) -> PauseHandle {
        let slot = {
            let mut clusters = self.clusters.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(clusters.entry(cluster.to_string()).or_default())
        };
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        slot.members().push(Member {
            key,
            name: thrasher.to_string(),
            paused: false,
        });
        tracing::debug!(cluster, thrasher, "thrasher registered");

        PauseHandle {
            key,
            name: thrasher.to_string(),
            cluster: cluster.to_string(),
            slot,
        }
    }

    /// Names of thrashers currently registered under `cluster`.
    pub fn members(&self, cluster: &str) -> Vec<String> {
        let clusters = self.clusters.lock().unwrap_or_else(|e| e.into_inner());
        clusters
            .get(cluster)
            .map(|slot| slot.members().iter().map(|m| m.name.clone()).collect())
            .unwrap_or_default()
    }
}

/// A thrasher's membership in a cluster's coordination slot.
///
/// Dropping the handle leaves the cluster and releases any sibling
/// waiting on it.
#[derive(Debug)]
pub struct PauseHandle {
    key: u64,
    name: String,
    cluster: String,
    slot: Arc<ClusterSlot>,
}

impl PauseHandle {
    /// Name this handle was registered with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cluster this handle belongs to.
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Names of the other registered thrashers.
    pub fn siblings(&self) -> Vec<String> {
        self.slot
            .members()
            .iter()
            .filter(|m| m.key != self.key)
            .map(|m| m.name.clone())
            .collect()
    }

    /// Whether our paused signal is raised.
    pub fn is_paused(&self) -> bool {
        self.slot
            .members()
            .iter()
            .any(|m| m.key == self.key && m.paused)
    }

    /// Acknowledge every paused sibling. Called at the start of each round.
    ///
    /// Returns the number of siblings released.
    pub fn checkpoint(&self) -> usize {
        let released = {
            let mut members = self.slot.members();
            let mut released = 0;
            for m in members.iter_mut().filter(|m| m.key != self.key && m.paused) {
                m.paused = false;
                released += 1;
            }
            released
        };
        if released > 0 {
            tracing::debug!(thrasher = %self.name, released, "released paused siblings");
            self.slot.changed.notify_waiters();
        }
        released
    }

    /// Wait for the cluster's disruption turn.
    ///
    /// Paused siblings are acknowledged before and while waiting, so a
    /// holder paused in its handoff is never blocked by us. Returns `None`
    /// if stop is requested first.
    pub async fn acquire_turn(&self, stop: &mut StopSignal) -> Option<TurnGuard> {
        let lock = Arc::clone(&self.slot.turn).lock_owned();
        tokio::pin!(lock);

        loop {
            let notified = self.slot.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            self.checkpoint();

            tokio::select! {
                guard = &mut lock => return Some(TurnGuard { _guard: guard }),
                _ = &mut notified => {}
                _ = stop.wait() => return None,
            }
        }
    }

    /// Pause until a sibling acknowledges us.
    pub async fn handoff(&self, stop: &mut StopSignal) -> Handoff {
        {
            let mut members = self.slot.members();
            if !members.iter().any(|m| m.key != self.key) {
                return Handoff::NoSibling;
            }

            let mut met = false;
            for m in members.iter_mut().filter(|m| m.key != self.key && m.paused) {
                m.paused = false;
                met = true;
            }
            if met {
                drop(members);
                self.slot.changed.notify_waiters();
                tracing::debug!(thrasher = %self.name, "rendezvous with paused sibling");
                return Handoff::Rendezvous;
            }

            if let Some(me) = members.iter_mut().find(|m| m.key == self.key) {
                me.paused = true;
            }
        }
        self.slot.changed.notify_waiters();

        tracing::info!(thrasher = %self.name, cluster = %self.cluster, "paused, waiting for sibling thrasher");

        loop {
            let notified = self.slot.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut members = self.slot.members();
                let still_paused = members.iter().any(|m| m.key == self.key && m.paused);
                if !still_paused {
                    tracing::info!(thrasher = %self.name, "resumed by sibling thrasher");
                    return Handoff::Acknowledged;
                }
                if !members.iter().any(|m| m.key != self.key) {
                    clear_paused(&mut members, self.key);
                    return Handoff::NoSibling;
                }
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = stop.wait() => {
                    clear_paused(&mut self.slot.members(), self.key);
                    return Handoff::Stopped;
                }
            }
        }
    }

    /// Leave the cluster. Idempotent.
    pub fn leave(&self) {
        let removed = {
            let mut members = self.slot.members();
            let before = members.len();
            members.retain(|m| m.key != self.key);
            members.len() != before
        };
        if removed {
            tracing::debug!(thrasher = %self.name, cluster = %self.cluster, "thrasher left cluster");
            self.slot.changed.notify_waiters();
        }
    }
}

impl Drop for PauseHandle {
    fn drop(&mut self) {
        self.leave();
    }
}

fn clear_paused(members: &mut [Member], key: u64) {
    if let Some(me) = members.iter_mut().find(|m| m.key == key) {
        me.paused = false;
    }
}
