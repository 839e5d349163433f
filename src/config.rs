//! Analysis settings: YAML file first, then `SPACEBATTLE_*` environment overrides.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::monte_carlo::fresh_seed;
use crate::error::ConfigError;
use crate::parallel::WorkerPool;

pub const SEED_ENV: &str = "SPACEBATTLE_SEED";
pub const TRIALS_ENV: &str = "SPACEBATTLE_TRIALS";
pub const WORKERS_ENV: &str = "SPACEBATTLE_WORKERS";

pub const DEFAULT_TRIALS: usize = 100_000;
pub const DEFAULT_BATCHES: usize = 64;
pub const DEFAULT_ROUND_CAP: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Monte Carlo trials per start state.
    pub trials: usize,
    /// Fixed seed; drawn from OS entropy when absent.
    pub seed: Option<u64>,
    /// Worker threads; 0 means the rayon default.
    pub workers: usize,
    /// Number of independent random streams a run is split into.
    pub batches: usize,
    /// Rounds after which a sampled combat is abandoned.
    pub round_cap: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: None,
            workers: 0,
            batches: DEFAULT_BATCHES,
            round_cap: DEFAULT_ROUND_CAP,
        }
    }
}

impl AnalysisConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&raw)?;
        debug!(path = %path.as_ref().display(), "loaded analysis config");
        Ok(config)
    }

    /// Optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|name| env::var(name).ok())
    }

    /// Applies overrides looked up by variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(SEED_ENV) {
            self.seed = Some(parse_env(SEED_ENV, &value)?);
        }
        if let Some(value) = lookup(TRIALS_ENV) {
            self.trials = parse_env(TRIALS_ENV, &value)?;
        }
        if let Some(value) = lookup(WORKERS_ENV) {
            self.workers = parse_env(WORKERS_ENV, &value)?;
        }
        Ok(self)
    }

    /// The configured seed, or a fresh one from OS entropy.
    pub fn resolve_seed(&self) -> u64 {
        match self.seed {
            Some(seed) => seed,
            None => {
                let seed = fresh_seed();
                info!(seed, "no seed configured, drew one from OS entropy");
                seed
            }
        }
    }

    pub fn worker_pool(&self) -> WorkerPool {
        WorkerPool::with_workers(self.workers)
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = AnalysisConfig::from_yaml_str("trials: 500\n").unwrap();
        assert_eq!(config.trials, 500);
        assert_eq!(config.batches, DEFAULT_BATCHES);
        assert_eq!(config.round_cap, DEFAULT_ROUND_CAP);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            AnalysisConfig::from_yaml_str("trails: 5\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn environment_overrides_file() {
        let config = AnalysisConfig::from_yaml_str("seed: 1\ntrials: 10\n")
            .unwrap()
            .with_overrides(|name| match name {
                SEED_ENV => Some("42".to_string()),
                WORKERS_ENV => Some(" 3 ".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.trials, 10);
        assert_eq!(config.workers, 3);
        assert_eq!(config.resolve_seed(), 42);
    }

    #[test]
    fn bad_environment_value_is_an_error() {
        let err = AnalysisConfig::default()
            .with_overrides(|name| (name == TRIALS_ENV).then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: TRIALS_ENV, .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = AnalysisConfig::from_file("/nonexistent/spacebattle.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }
}
