// =============================================================================
// Runtime Configuration — screener settings with atomic save
// =============================================================================
//
// Every tunable screener parameter lives here.  Persistence uses an atomic
// tmp + rename pattern to prevent corruption on crash.  All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an
// older config file.
//
// Secrets (the IPO calendar API key) come from the environment, never from
// this file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::Period;

/// Moving-average windows the screener knows how to display. Used when the
/// config selects none.
pub const MA_WINDOW_MENU: &[usize] = &[10, 20, 50, 100, 200];

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_lookback_days() -> i64 {
    365
}

fn default_ma_windows() -> Vec<usize> {
    vec![10, 20, 50]
}

fn default_refresh_interval_secs() -> u64 {
    900
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the screener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// How far back (days) the IPO calendar is searched.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,

    /// Selected SMA window lengths. Empty means "all of the menu".
    #[serde(default = "default_ma_windows")]
    pub ma_windows: Vec<usize>,

    /// Price-history period used for the table and charts.
    #[serde(default)]
    pub period: Period,

    /// Extra symbols merged into the IPO universe.
    #[serde(default)]
    pub manual_tickers: Vec<String>,

    /// Seconds between automatic screener refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            ma_windows: default_ma_windows(),
            period: Period::default(),
            manual_tickers: Vec::new(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl RuntimeConfig {
    /// The windows actually used for a screening pass: the configured
    /// selection, or the full menu when nothing is selected.
    pub fn effective_windows(&self) -> Vec<usize> {
        if self.ma_windows.is_empty() {
            MA_WINDOW_MENU.to_vec()
        } else {
            self.ma_windows.clone()
        }
    }

    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            lookback_days = config.lookback_days,
            period = %config.period,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.lookback_days, 365);
        assert_eq!(cfg.ma_windows, vec![10, 20, 50]);
        assert_eq!(cfg.period, Period::SixMonths);
        assert!(cfg.manual_tickers.is_empty());
        assert_eq!(cfg.refresh_interval_secs, 900);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.lookback_days, 365);
        assert_eq!(cfg.period, Period::SixMonths);
        assert_eq!(cfg.ma_windows, vec![10, 20, 50]);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "period": "1y", "manual_tickers": ["RDDT"] }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.period, Period::OneYear);
        assert_eq!(cfg.manual_tickers, vec!["RDDT"]);
        assert_eq!(cfg.lookback_days, 365);
        assert_eq!(cfg.refresh_interval_secs, 900);
    }

    #[test]
    fn roundtrip_serialisation() {
        let mut cfg = RuntimeConfig::default();
        cfg.ma_windows = vec![20, 50, 200];
        cfg.period = Period::OneMonth;

        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg2.ma_windows, vec![20, 50, 200]);
        assert_eq!(cfg2.period, Period::OneMonth);
    }

    #[test]
    fn empty_window_selection_falls_back_to_menu() {
        let mut cfg = RuntimeConfig::default();
        cfg.ma_windows = Vec::new();
        assert_eq!(cfg.effective_windows(), MA_WINDOW_MENU.to_vec());

        cfg.ma_windows = vec![10];
        assert_eq!(cfg.effective_windows(), vec![10]);
    }
}
