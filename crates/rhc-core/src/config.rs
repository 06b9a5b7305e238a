use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Maximum number of attempts per transfer (including the first).
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds; the wait before retrying attempt
    /// `n` is `2^n` times this, capped by `max_delay_secs`.
    pub base_delay_ms: u64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
    /// Wall-clock budget for a single attempt, in seconds.
    pub attempt_timeout_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay_ms: 100,
            max_delay_secs: 5 * 60,
            attempt_timeout_secs: 15 * 60,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_secs(self.max_delay_secs),
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/rhc/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RhcConfig {
    /// Maximum concurrently running attempt workers across all transfers in
    /// the process.
    pub max_concurrent_transfers: usize,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetrySettings>,
}

impl Default for RhcConfig {
    fn default() -> Self {
        Self {
            max_concurrent_transfers: 8,
            retry: None,
        }
    }
}

impl RhcConfig {
    /// Effective retry policy: the configured section or built-in defaults.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetrySettings::policy)
            .unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rhc")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RhcConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RhcConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: RhcConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_settings_match_policy_defaults() {
        let settings = RetrySettings::default();
        let policy = settings.policy();
        let defaults = RetryPolicy::default();
        assert_eq!(policy.max_attempts, defaults.max_attempts);
        assert_eq!(policy.base_delay, defaults.base_delay);
        assert_eq!(policy.max_delay, defaults.max_delay);
        assert_eq!(policy.attempt_timeout, defaults.attempt_timeout);
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut cfg = RhcConfig::default();
        cfg.retry = Some(RetrySettings {
            max_attempts: 3,
            base_delay_ms: 50,
            max_delay_secs: 10,
            attempt_timeout_secs: 30,
        });
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: RhcConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.max_concurrent_transfers, cfg.max_concurrent_transfers);
        let policy = parsed.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(50));
    }

    #[test]
    fn missing_retry_section_uses_defaults() {
        let parsed: RhcConfig = toml::from_str("max_concurrent_transfers = 4\n").unwrap();
        assert_eq!(parsed.max_concurrent_transfers, 4);
        assert_eq!(parsed.retry_policy().max_attempts, 10);
    }

    #[test]
    fn zero_attempts_is_clamped() {
        let settings = RetrySettings {
            max_attempts: 0,
            ..RetrySettings::default()
        };
        assert_eq!(settings.policy().max_attempts, 1);
    }
}
