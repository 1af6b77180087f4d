//! Tunables for the thrasher and the health verifier.
//!
//! Every field has a default, so an empty table is a valid configuration.
//! Unknown keys are ignored. Range checks are deferred to
//! `ThrashSettings::resolve` in thrash-core, which knows the roster size.

use crate::error::ConfigError;
use crate::ids::KillMethod;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default quota of disruptions per daemon within one window.
pub const DEFAULT_MAX_THRASH_TIMES: usize = 3;

/// Default rolling window length in seconds (30 minutes).
pub const DEFAULT_MAX_THRASH_PERIOD_SECS: f64 = 1800.0;

/// Largest accepted value, in seconds, for any delay, period or interval (ten years).
pub const MAX_CONFIG_SECS: f64 = 315_360_000.0;

/// Margin added to a `min_*` delay when its `max_*` is absent or below it.
pub const DEFAULT_DELAY_MARGIN_SECS: f64 = 30.0;

/// Thrasher configuration.
///
/// ```toml
/// seed = 42
/// randomize = true
/// max_thrash_daemons = 1
/// daemon_max_thrash_times = 3
/// daemon_max_thrash_period = 1800
/// min_thrash_delay = 60
/// min_revive_delay = 100
/// kill_methods = ["stop", "kill"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrashConfig {
    /// RNG seed. A random seed is drawn (and logged) when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Draw delays uniformly from `[min, max)`; when false, always use `min`.
    #[serde(default = "default_randomize")]
    pub randomize: bool,
    /// Maximum victims per round (default: roster size - 1).
    ///
    /// Also accepted as `max_thrash_daemons`. Setting both spellings in one
    /// table is a duplicate-field parse error.
    #[serde(default, alias = "max_thrash_daemons")]
    pub max_thrash: Option<usize>,
    /// Maximum disruptions of one daemon within the rolling window.
    #[serde(default = "default_max_thrash_times")]
    pub daemon_max_thrash_times: usize,
    /// Rolling window length in seconds.
    #[serde(default = "default_max_thrash_period")]
    pub daemon_max_thrash_period: f64,
    /// Minimum seconds between rounds.
    #[serde(default = "default_min_thrash_delay")]
    pub min_thrash_delay: f64,
    /// Maximum seconds between rounds (default: min + 30).
    #[serde(default)]
    pub max_thrash_delay: Option<f64>,
    /// Minimum seconds a victim stays down.
    #[serde(default = "default_min_revive_delay")]
    pub min_revive_delay: f64,
    /// Maximum seconds a victim stays down (default: min + 30).
    #[serde(default)]
    pub max_revive_delay: Option<f64>,
    /// Methods used to take victims down.
    #[serde(default = "default_kill_methods")]
    pub kill_methods: Vec<KillMethod>,
}

/// Health verifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Seconds between health samples.
    #[serde(default = "default_check_interval")]
    pub check_interval: f64,
}

fn default_randomize() -> bool {
    true
}

fn default_max_thrash_times() -> usize {
    DEFAULT_MAX_THRASH_TIMES
}

fn default_max_thrash_period() -> f64 {
    DEFAULT_MAX_THRASH_PERIOD_SECS
}

fn default_min_thrash_delay() -> f64 {
    60.0
}

fn default_min_revive_delay() -> f64 {
    100.0
}

fn default_kill_methods() -> Vec<KillMethod> {
    vec![KillMethod::Stop]
}

fn default_check_interval() -> f64 {
    10.0
}

impl Default for ThrashConfig {
    fn default() -> Self {
        Self {
            seed: None,
            randomize: default_randomize(),
            max_thrash: None,
            daemon_max_thrash_times: default_max_thrash_times(),
            daemon_max_thrash_period: default_max_thrash_period(),
            min_thrash_delay: default_min_thrash_delay(),
            max_thrash_delay: None,
            min_revive_delay: default_min_revive_delay(),
            max_revive_delay: None,
            kill_methods: default_kill_methods(),
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            check_interval: default_check_interval(),
        }
    }
}

impl ThrashConfig {
    /// Parse a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid TOML or a field has the
    /// wrong type. Range checks happen later, at resolve time.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Return a copy with fixed delays (`randomize = false`) and the given seed.
    pub fn deterministic(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self.randomize = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = ThrashConfig::default();
        assert!(config.randomize);
        assert_eq!(config.seed, None);
        assert_eq!(config.max_thrash, None);
        assert_eq!(config.daemon_max_thrash_times, 3);
        assert_eq!(config.daemon_max_thrash_period, 1800.0);
        assert_eq!(config.min_thrash_delay, 60.0);
        assert_eq!(config.min_revive_delay, 100.0);
        assert_eq!(config.kill_methods, vec![KillMethod::Stop]);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = ThrashConfig::from_toml_str("").unwrap();
        assert_eq!(config, ThrashConfig::default());
    }

    #[test]
    fn max_thrash_daemons_alias_accepted() {
        let config = ThrashConfig::from_toml_str("max_thrash_daemons = 2").unwrap();
        assert_eq!(config.max_thrash, Some(2));

        let config = ThrashConfig::from_toml_str("max_thrash = 1").unwrap();
        assert_eq!(config.max_thrash, Some(1));
    }

    #[test]
    fn both_max_thrash_spellings_rejected() {
        let err = ThrashConfig::from_toml_str("max_thrash = 1\nmax_thrash_daemons = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("duplicate field"), "{err}");
    }

    #[test]
    fn unknown_keys_ignored() {
        let config = ThrashConfig::from_toml_str(
            r#"
seed = 7
logger = "nvmeof.thrasher"
checker_host = "client.3"
"#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn full_toml_parses() {
        let toml = r#"
seed = 42
randomize = false
max_thrash = 1
daemon_max_thrash_times = 1
daemon_max_thrash_period = 3600
min_thrash_delay = 5
max_thrash_delay = 10.5
min_revive_delay = 2
max_revive_delay = 4
kill_methods = ["stop", "kill"]
"#;
        let config = ThrashConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.seed, Some(42));
        assert!(!config.randomize);
        assert_eq!(config.daemon_max_thrash_period, 3600.0);
        assert_eq!(config.max_thrash_delay, Some(10.5));
        assert_eq!(config.kill_methods, vec![KillMethod::Stop, KillMethod::Kill]);
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let err = ThrashConfig::from_toml_str("randomize = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn deterministic_pins_seed_and_disables_randomize() {
        let config = ThrashConfig::default().deterministic(9);
        assert_eq!(config.seed, Some(9));
        assert!(!config.randomize);
    }

    #[test]
    fn verifier_default_interval() {
        assert_eq!(VerifierConfig::default().check_interval, 10.0);
        let v: VerifierConfig = toml::from_str("").unwrap();
        assert_eq!(v.check_interval, 10.0);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = ThrashConfig::from_file(Path::new("/nonexistent/thrash.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
