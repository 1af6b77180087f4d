//! Bounded delay ranges.

use rand::Rng;
use std::time::Duration;

/// A `[min, max)` range of wait durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    /// Create a range. A `max` below `min` collapses to `min`.
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// A range that always yields `d`.
    pub fn fixed(d: Duration) -> Self {
        Self::new(d, d)
    }

    /// Lower bound.
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound (exclusive when greater than `min`).
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draw a delay.
    ///
    /// With `randomize` off, or an empty range, returns `min` without
    /// touching the RNG so the victim sequence is unaffected.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, randomize: bool) -> Duration {
        if !randomize || self.max <= self.min {
            return self.min;
        }
        let secs = rng.gen_range(self.min.as_secs_f64()..self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}
