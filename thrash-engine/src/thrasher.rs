//! The thrasher control loop.
//!
//! One round:
//!
//! 1. Exit if stop was requested.
//! 2. If paired with a sibling thrasher, take the cluster's disruption turn.
//! 3. Draw candidates, each daemon with probability `1/n`.
//! 4. Accept candidates in roster order, skipping daemons at quota and
//!    stopping at `max_thrash` victims.
//! 5. Take victims down, wait the revive delay in full, run the health
//!    checks, hand off to the sibling, then restart every victim.
//! 6. Wait the thrash delay, waking early on stop.
//!
//! A failed stop ends the round early: every daemon already touched is
//! restarted at once and the failure is captured. Accepted victims after
//! the failing one are left alone and are not counted as disrupted. Any captured failure
//! ends the loop.

use crate::clock::{Clock, TokioClock};
use crate::coordinator::{Handoff, PauseHandle};
use crate::daemon::{Daemon, Roster};
use crate::error::{DaemonOp, ThrashError};
use crate::health::HealthCheck;
use crate::lifecycle::{LoopControl, LoopExit, StopSignal};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use thrash_core::{
    accept_victims, choose_kill_method, draw_candidates, SkipReason, ThrashHistory, ThrashSettings,
};
use thrash_types::{DaemonId, KillMethod, RunState, ThrashConfig};

/// Victims of one productive round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    /// Round number, starting at 1.
    pub round: u64,
    /// Victims taken down, in roster order.
    pub victims: Vec<DaemonId>,
}

/// What a thrasher did over its run.
#[derive(Debug, Clone, Default)]
pub struct ThrashSummary {
    /// Seed the RNG was built from.
    pub seed: u64,
    /// Rounds started, including rounds with no victims.
    pub rounds: u64,
    /// Rounds that disrupted at least one daemon.
    pub disruptions: Vec<RoundReport>,
    /// Total disruptions per daemon.
    pub per_daemon: BTreeMap<DaemonId, usize>,
    /// Disruption timestamps per daemon.
    pub history: ThrashHistory,
}

impl ThrashSummary {
    fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    fn record(&mut self, round: u64, victims: Vec<DaemonId>) {
        for id in &victims {
            *self.per_daemon.entry(id.clone()).or_default() += 1;
        }
        self.disruptions.push(RoundReport { round, victims });
    }

    /// Total number of daemon disruptions.
    pub fn total_disruptions(&self) -> usize {
        self.per_daemon.values().sum()
    }
}

/// Randomized, rate-limited disruptor of a daemon roster.
#[derive(Debug)]
pub struct Thrasher {
    name: String,
    roster: Roster,
    config: ThrashConfig,
    clock: Arc<dyn Clock>,
    checks: Vec<Arc<dyn HealthCheck>>,
    pause: Option<PauseHandle>,
    seed: Option<u64>,
    control: LoopControl<ThrashSummary>,
}

impl Thrasher {
    /// Create an idle thrasher. Nothing is validated until [`start`](Self::start).
    pub fn new(name: impl Into<String>, roster: Roster, config: ThrashConfig) -> Self {
        Self {
            name: name.into(),
            roster,
            config,
            clock: Arc::new(TokioClock),
            checks: Vec::new(),
            pause: None,
            seed: None,
            control: LoopControl::new(),
        }
    }

    /// Seed the RNG with `seed`, overriding the configured seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Use `clock` for timestamps and waits.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run `check` after each revive wait. Results are logged only.
    pub fn with_health_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Coordinate disruption windows with sibling thrashers.
    pub fn with_pause_handle(mut self, handle: PauseHandle) -> Self {
        self.pause = Some(handle);
        self
    }

    /// Name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seed in use, once started.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Validate configuration and spawn the control loop.
    ///
    /// Returns immediately. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ThrashError::Config`] if the configuration is invalid and
    /// [`ThrashError::AlreadyStarted`] on a second call. On error the
    /// thrasher stays idle.
    pub fn start(&mut self) -> Result<(), ThrashError> {
        self.control.ensure_not_started()?;
        let settings = ThrashSettings::resolve(&self.config, self.roster.len())?;
        let seed = settings
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen::<u64>());
        self.seed = Some(seed);

        tracing::info!(
            thrasher = %self.name,
            seed,
            daemons = self.roster.len(),
            max_thrash = settings.max_thrash,
            randomize = settings.randomize,
            "thrasher starting"
        );

        let thrash_loop = ThrashLoop {
            name: self.name.clone(),
            ids: self.roster.ids(),
            roster: self.roster.clone(),
            rng: StdRng::seed_from_u64(seed),
            settings,
            history: ThrashHistory::new(),
            clock: Arc::clone(&self.clock),
            checks: self.checks.clone(),
            pause: self.pause.take(),
            stop: self.control.signal(),
            summary: ThrashSummary::new(seed),
        };
        self.control.spawn(thrash_loop.run());
        Ok(())
    }

    /// Request termination. Idempotent, and a no-op before start.
    ///
    /// An in-flight revive always completes first.
    pub fn stop(&self) {
        self.control.stop();
    }

    /// Wait for the loop to exit.
    ///
    /// Without a prior [`stop`](Self::stop) this only returns once the loop
    /// has captured a failure.
    pub async fn join(&mut self) {
        self.control.join().await;
    }

    /// Captured failure, if any. Meaningful after [`join`](Self::join).
    pub fn failure(&self) -> Option<&ThrashError> {
        self.control.failure()
    }

    /// Run summary, available after [`join`](Self::join).
    pub fn summary(&self) -> Option<&ThrashSummary> {
        self.control.report()
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.control.state()
    }
}

// ============================================================================
// Control loop
// ============================================================================

struct ThrashLoop {
    name: String,
    roster: Roster,
    ids: Vec<DaemonId>,
    settings: ThrashSettings,
    rng: StdRng,
    history: ThrashHistory,
    clock: Arc<dyn Clock>,
    checks: Vec<Arc<dyn HealthCheck>>,
    pause: Option<PauseHandle>,
    stop: StopSignal,
    summary: ThrashSummary,
}

impl ThrashLoop {
    async fn run(mut self) -> LoopExit<ThrashSummary> {
        let mut failure = None;

        loop {
            if self.stop.is_set() {
                break;
            }

            if let Err(e) = self.round().await {
                tracing::error!(thrasher = %self.name, round = self.summary.rounds, error = %e, "thrasher failed");
                failure = Some(e);
                break;
            }

            let delay = self
                .settings
                .thrash_delay
                .sample(&mut self.rng, self.settings.randomize);
            tracing::debug!(thrasher = %self.name, delay_secs = delay.as_secs_f64(), "waiting for next round");
            if self.stop.sleep_or_stop(self.clock.as_ref(), delay).await {
                break;
            }
        }

        if let Some(pause) = &self.pause {
            pause.leave();
        }

        let mut summary = self.summary;
        summary.history = self.history;
        tracing::info!(
            thrasher = %self.name,
            seed = summary.seed,
            rounds = summary.rounds,
            disruptions = summary.total_disruptions(),
            per_daemon = ?summary.per_daemon,
            "thrash summary"
        );

        LoopExit {
            failure,
            report: summary,
        }
    }

    async fn round(&mut self) -> Result<(), ThrashError> {
        self.summary.rounds += 1;
        let round = self.summary.rounds;

        // Held until every victim of this round is restarted.
        let _turn = match &self.pause {
            Some(pause) => match pause.acquire_turn(&mut self.stop).await {
                Some(turn) => Some(turn),
                None => return Ok(()),
            },
            None => None,
        };

        let now = self.clock.now();
        let candidates = draw_candidates(&mut self.rng, self.roster.len());
        let selection = accept_victims(
            &candidates,
            &self.ids,
            &self.history,
            now,
            self.settings.quota,
            self.settings.max_thrash,
        );

        for (index, reason) in &selection.skipped {
            let daemon = &self.ids[*index];
            match reason {
                SkipReason::RateLimited(next) => tracing::info!(
                    thrasher = %self.name,
                    round,
                    daemon = %daemon,
                    next = ?next,
                    "skipping daemon at thrash quota"
                ),
                SkipReason::CapReached => tracing::debug!(
                    thrasher = %self.name,
                    round,
                    daemon = %daemon,
                    "skipping daemon, round is at max_thrash"
                ),
            }
        }

        if selection.is_empty() {
            tracing::debug!(thrasher = %self.name, round, "no victims this round");
            return Ok(());
        }

        let count = selection.victims.len();
        if count > self.settings.max_thrash || count >= self.roster.len() {
            return Err(ThrashError::Invariant(format!(
                "{count} victims selected with max_thrash {} and {} daemons",
                self.settings.max_thrash,
                self.roster.len()
            )));
        }

        let victims: Vec<Arc<dyn Daemon>> = selection
            .victims
            .iter()
            .filter_map(|i| self.roster.get(*i).cloned())
            .collect();
        let victim_ids: Vec<DaemonId> = victims.iter().map(|d| d.id().clone()).collect();
        tracing::info!(thrasher = %self.name, round, victims = ?victim_ids, "thrashing daemons");

        let mut down: Vec<Arc<dyn Daemon>> = Vec::with_capacity(victims.len());
        // Victims whose stop or kill succeeded; only these count against the quota.
        let mut disrupted: Vec<DaemonId> = Vec::with_capacity(victims.len());
        let mut failure = None;
        for daemon in &victims {
            let method = choose_kill_method(
                &mut self.rng,
                &self.settings.kill_methods,
                self.settings.randomize,
            );
            // Restart is idempotent, so a daemon whose stop failed is revived too.
            down.push(Arc::clone(daemon));
            tracing::info!(
                thrasher = %self.name,
                daemon = %daemon.id(),
                host = daemon.host(),
                method = %method,
                "taking daemon down"
            );

            let (op, result) = match method {
                KillMethod::Stop => (DaemonOp::Stop, daemon.stop().await),
                KillMethod::Kill => (DaemonOp::Kill, daemon.kill().await),
            };
            match result {
                Ok(()) => {
                    self.history.record(daemon.id(), now);
                    disrupted.push(daemon.id().clone());
                }
                Err(source) => {
                    failure = Some(ThrashError::DaemonOperation {
                        daemon: daemon.id().clone(),
                        op,
                        source,
                    });
                    break;
                }
            }
        }

        if failure.is_none() {
            let delay = self
                .settings
                .revive_delay
                .sample(&mut self.rng, self.settings.randomize);
            tracing::info!(thrasher = %self.name, round, delay_secs = delay.as_secs_f64(), "waiting to revive");
            // Not interruptible: victims stay down for the full delay.
            self.clock.sleep(delay).await;

            self.run_health_checks().await;

            if let Some(pause) = &self.pause {
                match pause.handoff(&mut self.stop).await {
                    Handoff::NoSibling => {}
                    outcome => {
                        tracing::debug!(thrasher = %self.name, round, ?outcome, "handoff finished")
                    }
                }
            }
        }

        let revived = self.revive(&down).await;
        if !disrupted.is_empty() {
            self.summary.record(round, disrupted);
        }

        match failure {
            Some(e) => Err(e),
            None => revived,
        }
    }

    /// Restart every daemon in `down`, returning the first error.
    async fn revive(&self, down: &[Arc<dyn Daemon>]) -> Result<(), ThrashError> {
        let mut first_error = None;
        for daemon in down {
            tracing::info!(thrasher = %self.name, daemon = %daemon.id(), "reviving daemon");
            if let Err(source) = daemon.restart().await {
                tracing::error!(thrasher = %self.name, daemon = %daemon.id(), error = %source, "revive failed");
                first_error.get_or_insert(ThrashError::DaemonOperation {
                    daemon: daemon.id().clone(),
                    op: DaemonOp::Restart,
                    source,
                });
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn run_health_checks(&self) {
        for check in &self.checks {
            match check.check().await {
                Ok(status) if status.healthy => {
                    tracing::debug!(thrasher = %self.name, check = check.name(), detail = %status.detail, "health check passed")
                }
                Ok(status) => {
                    tracing::warn!(thrasher = %self.name, check = check.name(), detail = %status.detail, "health check unhealthy during thrash")
                }
                Err(e) => {
                    tracing::warn!(thrasher = %self.name, check = check.name(), error = %e, "health check could not run")
                }
            }
            tokio::task::yield_now().await;
        }
    }
}
