// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicator library.  Every
// series is returned as `Vec<Option<f64>>`, aligned index-for-index with the
// input bars: positions before an indicator's minimum lookback, and positions
// where a formula divides by zero, are `None` rather than zero or a sentinel.
//
// All windowed statistics are trailing-inclusive: the window for position i
// covers bars i-n+1 ..= i.  Rounding happens only at report assembly, never
// here, so dependent indicators (MACD histogram) do not compound rounding
// error.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod kdj;
pub mod ma;
pub mod macd;
pub mod mfi;
pub mod obv;
pub mod rsi;

/// An indicator series aligned with its bar series.
pub type Series = Vec<Option<f64>>;

use crate::bars::Bar;

// ---------------------------------------------------------------------------
// Shared window helpers
// ---------------------------------------------------------------------------

/// Division that treats a zero denominator or a non-finite result as
/// undefined.  Used uniformly by every formula instead of ad hoc guards.
pub(crate) fn safe_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

/// Trailing mean over a fully-defined input.
pub(crate) fn rolling_mean(values: &[f64], window: usize) -> Series {
    rolling_apply(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Trailing minimum over a fully-defined input.
pub(crate) fn rolling_min(values: &[f64], window: usize) -> Series {
    rolling_apply(values, window, |w| {
        w.iter().copied().fold(f64::INFINITY, f64::min)
    })
}

/// Trailing maximum over a fully-defined input.
pub(crate) fn rolling_max(values: &[f64], window: usize) -> Series {
    rolling_apply(values, window, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Trailing sample standard deviation (n-1 divisor) over a fully-defined
/// input.  Undefined for window 1.
pub(crate) fn rolling_std(values: &[f64], window: usize) -> Series {
    if window < 2 {
        return vec![None; values.len()];
    }
    rolling_apply(values, window, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (w.len() - 1) as f64;
        var.sqrt()
    })
}

fn rolling_apply(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Series {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    for i in (window.saturating_sub(1))..values.len() {
        out[i] = Some(f(&values[i + 1 - window..=i]));
    }
    out
}

/// Trailing mean over a partially-defined series.  A window containing any
/// undefined position is undefined, matching the lookback semantics of the
/// raw input (e.g. deltas have no value at position 0).
pub(crate) fn rolling_mean_opt(values: &[Option<f64>], window: usize) -> Series {
    rolling_apply_opt(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Trailing sum over a partially-defined series; same window rule as
/// `rolling_mean_opt`.
pub(crate) fn rolling_sum_opt(values: &[Option<f64>], window: usize) -> Series {
    rolling_apply_opt(values, window, |w| w.iter().sum::<f64>())
}

fn rolling_apply_opt(values: &[Option<f64>], window: usize, f: impl Fn(&[f64]) -> f64) -> Series {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    let mut buf = Vec::with_capacity(window);
    for i in (window - 1)..values.len() {
        buf.clear();
        for v in &values[i + 1 - window..=i] {
            match v {
                Some(x) => buf.push(*x),
                None => break,
            }
        }
        if buf.len() == window {
            out[i] = Some(f(&buf));
        }
    }
    out
}

/// Typical price per bar: (high + low + close) / 3.  Input to MFI and CCI.
pub(crate) fn typical_prices(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .map(|b| (b.high + b.low + b.close) / 3.0)
        .collect()
}

/// Close prices extracted from a bar series.
pub(crate) fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Volumes extracted from a bar series.
pub(crate) fn volumes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume).collect()
}
