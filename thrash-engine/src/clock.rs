//! Time source and blocking waits.

use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Time source for the control loops.
///
/// `sleep` must be a real wait, not a poll. Loops decide separately
/// whether a given wait may be cut short by a stop request.
#[async_trait]
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Wait for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer.
///
/// Honors `tokio::time::pause()`, so tests can run hours of thrashing in
/// virtual time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
