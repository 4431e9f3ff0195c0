// =============================================================================
// KDJ Stochastic Oscillator
// =============================================================================
//
// RSV = 100 * (close - low_min(n)) / (high_max(n) - low_min(n))
// K   = smoothed RSV, factor 1/k_period
// D   = smoothed K,   factor 1/d_period
// J   = 3K - 2D
//
// A zero high-low range leaves RSV undefined at that position.  The recursive
// smoothers seed at the first defined input; a later undefined input yields
// an undefined output position without resetting the smoother state.

use super::{rolling_max, rolling_min, safe_div, Series};
use crate::bars::Bar;

/// The K, D and J series, aligned with the input bars.
#[derive(Debug, Clone)]
pub struct Kdj {
    pub k: Series,
    pub d: Series,
    pub j: Series,
}

/// Compute KDJ (conventionally 9/3/3).
pub fn kdj(bars: &[Bar], period: usize, k_period: usize, d_period: usize) -> Kdj {
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();

    let low_min = rolling_min(&lows, period);
    let high_max = rolling_max(&highs, period);

    let rsv: Series = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (low_min[i], high_max[i]) {
            (Some(lo), Some(hi)) => safe_div(bar.close - lo, hi - lo).map(|r| r * 100.0),
            _ => None,
        })
        .collect();

    let k = smooth(&rsv, k_period);
    let d = smooth(&k, d_period);

    let j: Series = k
        .iter()
        .zip(d.iter())
        .map(|pair| match pair {
            (Some(k), Some(d)) => Some(3.0 * k - 2.0 * d),
            _ => None,
        })
        .collect();

    Kdj { k, d, j }
}

/// Recursive smoothing with factor `1 / period`, seeded at the first defined
/// input value.
fn smooth(values: &[Option<f64>], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    let alpha = 1.0 / period as f64;

    let mut state: Option<f64> = None;
    for (i, v) in values.iter().enumerate() {
        if let Some(v) = v {
            let next = match state {
                Some(prev) => alpha * v + (1.0 - alpha) * prev,
                None => *v,
            };
            state = Some(next);
            out[i] = state;
        }
    }
    out
}
