//! Validation of raw configuration into resolved settings.
//!
//! [`ThrashSettings::resolve`] is the single place where configuration is
//! checked. It fails fast on a roster smaller than two, negative,
//! non-finite or oversized seconds, and an empty kill method list. It fills in derived
//! values: the per-round cap defaults to (and is clamped at) roster size
//! minus one, and a missing or inverted `max_*` delay becomes
//! `min + DEFAULT_DELAY_MARGIN_SECS`.

use crate::delay::DelayRange;
use crate::history::RateQuota;
use std::time::Duration;
use thrash_types::{
    ConfigError, KillMethod, ThrashConfig, VerifierConfig, DEFAULT_DELAY_MARGIN_SECS,
    MAX_CONFIG_SECS,
};

/// Validated thrasher settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrashSettings {
    /// Configured seed, if any.
    pub seed: Option<u64>,
    /// Draw delays from their ranges instead of using the minimum.
    pub randomize: bool,
    /// Maximum victims per round, at most roster size - 1.
    pub max_thrash: usize,
    /// Per-daemon rolling-window quota.
    pub quota: RateQuota,
    /// Wait between rounds.
    pub thrash_delay: DelayRange,
    /// Wait between taking victims down and reviving them.
    pub revive_delay: DelayRange,
    /// Methods used to take victims down.
    pub kill_methods: Vec<KillMethod>,
}

impl ThrashSettings {
    /// Validate `config` against a roster of `roster_len` daemons.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the roster is too small or any bound is
    /// out of range.
    pub fn resolve(config: &ThrashConfig, roster_len: usize) -> Result<Self, ConfigError> {
        if roster_len < 2 {
            return Err(ConfigError::RosterTooSmall { size: roster_len });
        }
        if config.kill_methods.is_empty() {
            return Err(ConfigError::NoKillMethods);
        }

        let period = seconds("daemon_max_thrash_period", config.daemon_max_thrash_period)?;
        let thrash_delay = delay_range(
            ("min_thrash_delay", config.min_thrash_delay),
            ("max_thrash_delay", config.max_thrash_delay),
        )?;
        let revive_delay = delay_range(
            ("min_revive_delay", config.min_revive_delay),
            ("max_revive_delay", config.max_revive_delay),
        )?;

        let ceiling = roster_len - 1;
        let max_thrash = config.max_thrash.unwrap_or(ceiling).min(ceiling);

        Ok(Self {
            seed: config.seed,
            randomize: config.randomize,
            max_thrash,
            quota: RateQuota::new(config.daemon_max_thrash_times, period),
            thrash_delay,
            revive_delay,
            kill_methods: config.kill_methods.clone(),
        })
    }
}

/// Validated verifier settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierSettings {
    /// Wait between health samples.
    pub check_interval: Duration,
}

impl VerifierSettings {
    /// Validate `config` for a verifier with `check_count` health checks.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if there are no checks or the interval is
    /// out of range.
    pub fn resolve(config: &VerifierConfig, check_count: usize) -> Result<Self, ConfigError> {
        if check_count == 0 {
            return Err(ConfigError::NoHealthChecks);
        }
        Ok(Self {
            check_interval: seconds("check_interval", config.check_interval)?,
        })
    }
}

fn seconds(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(ConfigError::NegativeValue { field, value });
    }
    // Keeps `Instant + duration` in range for window and sleep arithmetic.
    if value > MAX_CONFIG_SECS {
        return Err(ConfigError::TooLarge {
            field,
            value,
            max: MAX_CONFIG_SECS,
        });
    }
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::NotFinite { field })
}

fn delay_range(
    (min_field, min): (&'static str, f64),
    (max_field, max): (&'static str, Option<f64>),
) -> Result<DelayRange, ConfigError> {
    let min_d = seconds(min_field, min)?;
    let max_d = match max {
        Some(m) if m >= min => seconds(max_field, m)?,
        Some(m) if !m.is_finite() => return Err(ConfigError::NotFinite { field: max_field }),
        _ => seconds(max_field, min + DEFAULT_DELAY_MARGIN_SECS)?,
    };
    Ok(DelayRange::new(min_d, max_d))
}
