use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Env var selecting the active profile (e.g. `PROD`).
pub const PROFILE_ENV: &str = "CONQUEUE_PROFILE";

/// Env var overriding the concurrency ceiling.
pub const CONCURRENCY_ENV: &str = "CONQUEUE_CONCURRENCY";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

// ── Limiter config ────────────────────────────────────────────

/// Settings for a concurrency limiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Maximum number of tasks running at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// On-disk layout: everything lives under a `[limiter]` table.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    limiter: LimiterConfig,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

impl LimiterConfig {
    /// A config with an explicit ceiling.
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self { concurrency }
    }

    /// Build config from environment variables, loading `.env` first.
    ///
    /// Profile is read from `CONQUEUE_PROFILE`. When set (e.g. `PROD`),
    /// `PROD_CONQUEUE_CONCURRENCY` wins over `CONQUEUE_CONCURRENCY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        let profile = env_opt(PROFILE_ENV).unwrap_or_default().to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides(&profile.to_uppercase());
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a TOML string, then apply env overrides.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(toml_str)?;
        let mut config = file.limiter;
        let profile = env_opt(PROFILE_ENV).unwrap_or_default().to_uppercase();
        config.apply_env_overrides(&profile);
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Apply `CONQUEUE_*` environment overrides for the given profile.
    ///
    /// Unparseable values are ignored and logged.
    pub(crate) fn apply_env_overrides(&mut self, profile: &str) {
        if let Some(raw) = profiled_env_opt(profile, CONCURRENCY_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(n) => self.concurrency = n,
                Err(_) => tracing::warn!(value = %raw, "ignoring unparseable {CONCURRENCY_ENV}"),
            }
        }
    }

    /// Reject a ceiling the limiter cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(concurrency = self.concurrency, "limiter config loaded");
    }
}
