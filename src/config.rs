// =============================================================================
// Analysis Configuration — engine tunables with per-field serde defaults
// =============================================================================
//
// Every field carries `#[serde(default = "...")]` so that older or partial
// JSON config files keep loading after new fields are added.  The config is
// optional: when `TA_ENGINE_CONFIG` is unset the engine runs on defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV_VAR: &str = "TA_ENGINE_CONFIG";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_max_bars() -> usize {
    500
}

fn default_volume_avg_window() -> usize {
    20
}

fn default_volume_ratio_threshold() -> f64 {
    2.0
}

fn default_price_change_threshold() -> f64 {
    3.0
}

// =============================================================================
// AnalysisConfig
// =============================================================================

/// Tunable parameters for the analysis engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Hard cap on the number of bars processed per timeframe (oldest are
    /// truncated first).  Bounds compute cost for oversized payloads.
    #[serde(default = "default_max_bars")]
    pub max_bars: usize,

    /// Window for the trailing volume average used by the anomaly detector
    /// and the volume risk rules.
    #[serde(default = "default_volume_avg_window")]
    pub volume_avg_window: usize,

    /// Volume must exceed its trailing average by this multiple to count as
    /// an anomaly.
    #[serde(default = "default_volume_ratio_threshold")]
    pub volume_ratio_threshold: f64,

    /// Same-bar price change (percent, absolute) required alongside the
    /// volume spike for an anomaly.
    #[serde(default = "default_price_change_threshold")]
    pub price_change_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_bars: default_max_bars(),
            volume_avg_window: default_volume_avg_window(),
            volume_ratio_threshold: default_volume_ratio_threshold(),
            price_change_threshold: default_price_change_threshold(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(path = %path.display(), "analysis config loaded");
        Ok(config)
    }

    /// Resolve the effective config: the file named by `TA_ENGINE_CONFIG`
    /// when set and readable, defaults otherwise.
    pub fn from_env() -> Self {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load(&path).unwrap_or_else(|e| {
                warn!(error = %e, "failed to load config, using defaults");
                Self::default()
            }),
            _ => Self::default(),
        }
    }
}
