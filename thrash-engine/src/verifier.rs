//! Health verifier loop.
//!
//! Samples every registered [`HealthCheck`] in turn, yielding between
//! checks, then waits `check_interval`. The first unhealthy sample, or a
//! check that cannot run, is captured as [`ThrashError::HealthViolation`]
//! and ends the loop. The verifier never touches the thrasher; the harness
//! decides what to do after reading both failures.

use crate::clock::{Clock, TokioClock};
use crate::error::ThrashError;
use crate::health::HealthCheck;
use crate::lifecycle::{LoopControl, LoopExit, StopSignal};
use std::sync::Arc;
use thrash_core::VerifierSettings;
use thrash_types::{RunState, VerifierConfig};

/// Counters for one verifier run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifierSummary {
    /// Passes over the full check list.
    pub samples: u64,
    /// Individual check executions.
    pub checks_run: u64,
}

/// Independent loop asserting cluster and data-path health.
#[derive(Debug)]
pub struct Verifier {
    name: String,
    config: VerifierConfig,
    clock: Arc<dyn Clock>,
    checks: Vec<Arc<dyn HealthCheck>>,
    control: LoopControl<VerifierSummary>,
}

impl Verifier {
    /// Create an idle verifier with no checks.
    pub fn new(name: impl Into<String>, config: VerifierConfig) -> Self {
        Self {
            name: name.into(),
            config,
            clock: Arc::new(TokioClock),
            checks: Vec::new(),
            control: LoopControl::new(),
        }
    }

    /// Add a check to every sample.
    pub fn with_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Use `clock` for waits.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validate configuration and spawn the sampling loop.
    ///
    /// # Errors
    ///
    /// Returns [`ThrashError::Config`] with no checks registered or an
    /// invalid interval, and [`ThrashError::AlreadyStarted`] on a second call.
    pub fn start(&mut self) -> Result<(), ThrashError> {
        self.control.ensure_not_started()?;
        let settings = VerifierSettings::resolve(&self.config, self.checks.len())?;

        tracing::info!(
            verifier = %self.name,
            checks = self.checks.len(),
            interval_secs = settings.check_interval.as_secs_f64(),
            "verifier starting"
        );

        let verify_loop = VerifyLoop {
            name: self.name.clone(),
            settings,
            clock: Arc::clone(&self.clock),
            checks: self.checks.clone(),
            stop: self.control.signal(),
            summary: VerifierSummary::default(),
        };
        self.control.spawn(verify_loop.run());
        Ok(())
    }

    /// Request termination. Idempotent.
    pub fn stop(&self) {
        self.control.stop();
    }

    /// Wait for the loop to exit.
    pub async fn join(&mut self) {
        self.control.join().await;
    }

    /// Captured violation, if any.
    pub fn failure(&self) -> Option<&ThrashError> {
        self.control.failure()
    }

    /// Sample counters, available after [`join`](Self::join).
    pub fn summary(&self) -> Option<&VerifierSummary> {
        self.control.report()
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.control.state()
    }
}

struct VerifyLoop {
    name: String,
    settings: VerifierSettings,
    clock: Arc<dyn Clock>,
    checks: Vec<Arc<dyn HealthCheck>>,
    stop: StopSignal,
    summary: VerifierSummary,
}

impl VerifyLoop {
    async fn run(mut self) -> LoopExit<VerifierSummary> {
        let mut failure = None;

        loop {
            if self.stop.is_set() {
                break;
            }

            if let Err(e) = self.sample().await {
                tracing::error!(verifier = %self.name, error = %e, "health verification failed");
                failure = Some(e);
                break;
            }

            if self
                .stop
                .sleep_or_stop(self.clock.as_ref(), self.settings.check_interval)
                .await
            {
                break;
            }
        }

        tracing::info!(
            verifier = %self.name,
            samples = self.summary.samples,
            checks_run = self.summary.checks_run,
            "verifier finished"
        );
        LoopExit {
            failure,
            report: self.summary,
        }
    }

    async fn sample(&mut self) -> Result<(), ThrashError> {
        self.summary.samples += 1;

        for check in &self.checks {
            self.summary.checks_run += 1;
            match check.check().await {
                Ok(status) if status.healthy => {
                    tracing::debug!(verifier = %self.name, check = check.name(), detail = %status.detail, "healthy");
                }
                Ok(status) => {
                    return Err(ThrashError::HealthViolation {
                        check: check.name().to_string(),
                        detail: status.detail,
                    });
                }
                Err(e) => {
                    return Err(ThrashError::HealthViolation {
                        check: check.name().to_string(),
                        detail: e.to_string(),
                    });
                }
            }
            tokio::task::yield_now().await;
        }
        Ok(())
    }
}
