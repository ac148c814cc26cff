//! Sync settings: batch bounds, retry schedule, concurrency, deadline.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Tunables for one reconciliation run.
///
/// Defaults are conservative; marketplace-specific limits (e.g. Ozon caps
/// stock batches at 100 items) are applied by lowering `max_batch_size` in
/// the settings file, never by the adapters silently re-chunking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncSettings {
    /// Commands per protocol call. Must be >= 1.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Total submission attempts per batch, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First backoff delay in milliseconds; doubles per attempt.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Backoff ceiling in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Batches in flight at once; bounded by marketplace rate limits.
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,
    /// Run deadline in seconds. Absent means no deadline.
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

fn default_max_batch_size() -> usize {
    100
}
fn default_max_attempts() -> u32 {
    4
}
fn default_base_delay_ms() -> u64 {
    250
}
fn default_max_delay_ms() -> u64 {
    5_000
}
fn default_max_concurrent_batches() -> usize {
    2
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_concurrent_batches: default_max_concurrent_batches(),
            deadline_secs: None,
        }
    }
}

impl SyncSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            bail!("SETTINGS_INVALID: max_batch_size must be >= 1");
        }
        if self.max_attempts == 0 {
            bail!("SETTINGS_INVALID: max_attempts must be >= 1");
        }
        if self.max_concurrent_batches == 0 {
            bail!("SETTINGS_INVALID: max_concurrent_batches must be >= 1");
        }
        if self.base_delay_ms > self.max_delay_ms {
            bail!(
                "SETTINGS_INVALID: base_delay_ms ({}) exceeds max_delay_ms ({})",
                self.base_delay_ms,
                self.max_delay_ms
            );
        }
        if self.deadline_secs == Some(0) {
            bail!("SETTINGS_INVALID: deadline_secs of 0 would skip every batch");
        }
        Ok(())
    }
}

/// Load settings from an optional YAML file.
///
/// `None` returns validated defaults. Unknown keys in the file are a hard
/// error: a typo in `max_batch_sise` silently running with the default has
/// bitten enough people.
pub fn load_settings(path: Option<&Path>) -> Result<SyncSettings> {
    let settings = match path {
        None => SyncSettings::default(),
        Some(p) => {
            let raw = fs::read_to_string(p)
                .with_context(|| format!("failed to read settings file: {}", p.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("invalid settings yaml: {}", p.display()))?
        }
    };
    settings.validate()?;
    Ok(settings)
}

/// Deterministic hash of the effective settings, logged with each run so
/// identical reports can be traced to identical configuration.
pub fn settings_hash(settings: &SyncSettings) -> Result<String> {
    let canonical =
        serde_json::to_string(settings).context("canonical settings serialize failed")?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let s = SyncSettings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.max_batch_size, 100);
        assert_eq!(s.max_attempts, 4);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let s: SyncSettings = serde_yaml::from_str("max_batch_size: 1000\n").unwrap();
        assert_eq!(s.max_batch_size, 1000);
        assert_eq!(s.max_attempts, 4);
        assert_eq!(s.deadline_secs, None);
    }

    #[test]
    fn unknown_key_rejected() {
        let res: Result<SyncSettings, _> = serde_yaml::from_str("max_batch_sise: 10\n");
        assert!(res.is_err());
    }

    #[test]
    fn zero_bounds_rejected() {
        let mut s = SyncSettings::default();
        s.max_batch_size = 0;
        assert!(s.validate().is_err());

        let mut s = SyncSettings::default();
        s.max_concurrent_batches = 0;
        assert!(s.validate().is_err());

        let mut s = SyncSettings::default();
        s.deadline_secs = Some(0);
        assert!(s.validate().is_err());
    }

    #[test]
    fn hash_is_stable_and_input_sensitive() {
        let a = SyncSettings::default();
        let mut b = SyncSettings::default();
        assert_eq!(settings_hash(&a).unwrap(), settings_hash(&b).unwrap());
        b.max_batch_size = 50;
        assert_ne!(settings_hash(&a).unwrap(), settings_hash(&b).unwrap());
    }
}
