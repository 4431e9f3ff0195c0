// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
// diff      = EMA(close, fast) - EMA(close, slow)
// signal    = EMA(diff, signal_period)
// histogram = diff - signal
//
// The diff line becomes defined once the slow EMA does; the signal line needs
// a further `signal_period` diff values on top of that.

use super::ema::{ema, ema_over};
use super::Series;

/// The three MACD series, all aligned with the input closes.
#[derive(Debug, Clone)]
pub struct Macd {
    pub diff: Series,
    pub signal: Series,
    pub histogram: Series,
}

/// Compute MACD with the given EMA periods (conventionally 12/26/9).
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> Macd {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);

    let diff: Series = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|pair| match pair {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let signal = ema_over(&diff, signal_period);

    let histogram: Series = diff
        .iter()
        .zip(signal.iter())
        .map(|pair| match pair {
            (Some(d), Some(s)) => Some(d - s),
            _ => None,
        })
        .collect();

    Macd {
        diff,
        signal,
        histogram,
    }
}
