// =============================================================================
// Anomaly Detector — joint volume / price-move outliers
// =============================================================================
//
// A bar is anomalous when its volume exceeds the trailing average by a
// configurable multiple AND its same-bar price change exceeds a percentage
// threshold.  The first bar (no previous close) and bars without a defined
// trailing average can never be flagged.

use serde::{Deserialize, Serialize};

use crate::bars::{format_timestamp, Bar};
use crate::config::AnalysisConfig;
use crate::indicators::{rolling_mean, safe_div, volumes};
use crate::report::round2;

/// One flagged bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub date: String,
    pub volume: f64,
    #[serde(rename = "priceChangePct")]
    pub price_change_pct: f64,
    #[serde(rename = "volumeRatio")]
    pub volume_ratio: f64,
}

/// Scan the whole series for volume/price anomalies.
pub fn detect_anomalies(bars: &[Bar], config: &AnalysisConfig) -> Vec<Anomaly> {
    let volume_avg = rolling_mean(&volumes(bars), config.volume_avg_window);

    let mut anomalies = Vec::new();
    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            continue;
        }
        let Some(avg) = volume_avg[i] else { continue };
        let Some(ratio) = safe_div(bar.volume, avg) else {
            continue;
        };
        let prev_close = bars[i - 1].close;
        let Some(change) = safe_div(bar.close - prev_close, prev_close) else {
            continue;
        };
        let change_pct = change * 100.0;

        if ratio > config.volume_ratio_threshold && change_pct.abs() > config.price_change_threshold
        {
            anomalies.push(Anomaly {
                date: format_timestamp(bar.timestamp),
                volume: bar.volume,
                price_change_pct: round2(change_pct),
                volume_ratio: round2(ratio),
            });
        }
    }
    anomalies
}
