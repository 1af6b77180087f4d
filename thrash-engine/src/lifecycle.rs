//! Start/stop/join wiring shared by the thrasher and the verifier.

use crate::clock::Clock;
use crate::error::ThrashError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thrash_types::RunState;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Receiving side of a loop's stop request.
///
/// Also reports stop once the owning handle is dropped, so an abandoned
/// loop winds down instead of running unsupervised.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// A signal paired with its sender.
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// Returns true once stop has been requested.
    pub fn is_set(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Wait until stop is requested.
    pub async fn wait(&mut self) {
        // Err means the sender is gone, which counts as stop.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }

    /// Yield, then wait `duration` unless stop arrives first.
    ///
    /// Returns true if the loop should exit.
    pub async fn sleep_or_stop(&mut self, clock: &dyn Clock, duration: Duration) -> bool {
        tokio::task::yield_now().await;
        if self.is_set() {
            return true;
        }
        tokio::select! {
            _ = clock.sleep(duration) => self.is_set(),
            _ = self.wait() => true,
        }
    }
}

/// What a loop hands back when it exits.
#[derive(Debug)]
pub(crate) struct LoopExit<T> {
    pub failure: Option<ThrashError>,
    pub report: T,
}

/// Owner-side control of one spawned loop.
#[derive(Debug)]
pub(crate) struct LoopControl<T> {
    stop_tx: watch::Sender<bool>,
    stop_rx: StopSignal,
    state: Arc<watch::Sender<RunState>>,
    handle: Option<JoinHandle<LoopExit<T>>>,
    started: bool,
    failure: Option<ThrashError>,
    report: Option<T>,
}

impl<T: Send + 'static> LoopControl<T> {
    pub fn new() -> Self {
        let (stop_tx, stop_rx) = StopSignal::channel();
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            stop_tx,
            stop_rx,
            state: Arc::new(state),
            handle: None,
            started: false,
            failure: None,
            report: None,
        }
    }

    pub fn ensure_not_started(&self) -> Result<(), ThrashError> {
        if self.started {
            return Err(ThrashError::AlreadyStarted);
        }
        Ok(())
    }

    pub fn signal(&self) -> StopSignal {
        self.stop_rx.clone()
    }

    /// Spawn `body` on the current tokio runtime and mark the loop running.
    pub fn spawn<F>(&mut self, body: F)
    where
        F: Future<Output = LoopExit<T>> + Send + 'static,
    {
        self.started = true;
        self.state.send_replace(RunState::Running);
        let state = Arc::clone(&self.state);
        self.handle = Some(tokio::spawn(async move {
            let exit = body.await;
            state.send_replace(RunState::Stopped);
            exit
        }));
    }

    /// Request termination. Idempotent.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
        self.state.send_if_modified(|s| {
            if *s == RunState::Running {
                *s = RunState::Stopping;
                true
            } else {
                false
            }
        });
    }

    /// Wait for the loop to exit and collect its outcome.
    pub async fn join(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        match handle.await {
            Ok(exit) => {
                self.failure = exit.failure;
                self.report = Some(exit.report);
            }
            Err(e) => {
                self.state.send_replace(RunState::Stopped);
                self.failure = Some(ThrashError::Aborted(e.to_string()));
            }
        }
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    pub fn failure(&self) -> Option<&ThrashError> {
        self.failure.as_ref()
    }

    pub fn report(&self) -> Option<&T> {
        self.report.as_ref()
    }
}
