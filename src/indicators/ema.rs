// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// multiplier = 2 / (period + 1)
// EMA_t      = value_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The first EMA value is seeded with the SMA of the first `period` inputs, so
// the series is undefined before `period` bars exist.

use super::Series;

/// EMA series aligned with `values`; undefined before index `period - 1`.
pub fn ema(values: &[f64], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let multiplier = 2.0 / (period + 1) as f64;
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    out[period - 1] = Some(seed);
    let mut prev = seed;
    for i in period..values.len() {
        prev = values[i] * multiplier + prev * (1.0 - multiplier);
        out[i] = Some(prev);
    }
    out
}

/// EMA over a partially-defined series: smoothing starts once the input
/// becomes defined, and the output stays aligned with the input.
///
/// The defined region is assumed to be a contiguous tail (true for every
/// derived series in this crate, e.g. the MACD diff line).
pub fn ema_over(values: &[Option<f64>], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    let Some(first) = values.iter().position(|v| v.is_some()) else {
        return out;
    };

    let tail: Vec<f64> = values[first..]
        .iter()
        .take_while(|v| v.is_some())
        .map(|v| v.unwrap())
        .collect();

    for (j, v) in ema(&tail, period).into_iter().enumerate() {
        out[first + j] = v;
    }
    out
}
