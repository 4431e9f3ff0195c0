// =============================================================================
// Risk-Warning Generator — heuristic rules over the latest bar
// =============================================================================
//
// Five stateless rules evaluated against the most recent bar's indicator
// values only.  Evaluation order is fixed so the output is deterministic;
// a rule whose input indicator is undefined is skipped.

use crate::bars::Bar;
use crate::config::AnalysisConfig;
use crate::indicators::{closes, ma::moving_average, rolling_mean, rsi::rsi, volumes};

const RSI_PERIOD: usize = 14;
const VOLUME_CONTRACTION_FACTOR: f64 = 0.7;
const VOLUME_SPIKE_FACTOR: f64 = 2.0;
const MA20_DISCOUNT_FACTOR: f64 = 0.95;

/// Produce the warning list for the latest bar of the series.
pub fn risk_warnings(bars: &[Bar], config: &AnalysisConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let Some(latest) = bars.last() else {
        return warnings;
    };

    let closes = closes(bars);

    if let Some(rsi) = rsi(&closes, RSI_PERIOD).last().copied().flatten() {
        if rsi > 70.0 {
            warnings.push("RSI approaching the overbought zone, short-term pullback risk".into());
        } else if rsi < 30.0 {
            warnings.push("RSI in the oversold zone, a rebound is possible".into());
        }
    }

    let volume_avg = rolling_mean(&volumes(bars), config.volume_avg_window);
    if let Some(avg) = volume_avg.last().copied().flatten() {
        if latest.volume < avg * VOLUME_CONTRACTION_FACTOR {
            warnings.push("Recent volume is contracting, watch for pullback risk".into());
        } else if latest.volume > avg * VOLUME_SPIKE_FACTOR {
            warnings.push("Abnormal volume spike, watch where the capital flows".into());
        }
    }

    if let Some(ma20) = moving_average(&closes, 20).last().copied().flatten() {
        if latest.close < ma20 * MA20_DISCOUNT_FACTOR {
            warnings
                .push("Price is well below the 20-period average, short-term trend is weak".into());
        }
    }

    warnings
}
