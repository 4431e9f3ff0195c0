// =============================================================================
// Relative Strength Index (RSI)
// =============================================================================
//
// RS  = trailing mean(gain) / trailing mean(loss) over `period` bars, with
//       gains and losses taken from close-over-close deltas (losses as
//       positive magnitudes).
// RSI = 100 - 100 / (1 + RS)
//
// Deltas need a previous close, so the series is undefined before
// `period + 1` bars.  A zero average loss against a positive average gain
// saturates at 100; zero gain and zero loss (a flat window) is undefined.
//
// Thresholds used elsewhere:  RSI > 70 => overbought,  RSI < 30 => oversold.

use super::{rolling_mean_opt, Series};

/// RSI series aligned with `closes`.
pub fn rsi(closes: &[f64], period: usize) -> Series {
    let n = closes.len();
    let mut gains: Vec<Option<f64>> = vec![None; n];
    let mut losses: Vec<Option<f64>> = vec![None; n];
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        gains[i] = Some(delta.max(0.0));
        losses[i] = Some((-delta).max(0.0));
    }

    let avg_gain = rolling_mean_opt(&gains, period);
    let avg_loss = rolling_mean_opt(&losses, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|pair| match pair {
            (Some(gain), Some(loss)) => {
                if *loss == 0.0 {
                    (*gain > 0.0).then_some(100.0)
                } else {
                    Some(100.0 - 100.0 / (1.0 + gain / loss))
                }
            }
            _ => None,
        })
        .collect()
}
