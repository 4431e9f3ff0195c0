// =============================================================================
// Commodity Channel Index (CCI)
// =============================================================================
//
// CCI = (typicalPrice - SMA(typicalPrice, n)) / (0.015 * MAD)
//
// where MAD is the mean absolute deviation of the window's typical prices
// about that same window's SMA.  A zero deviation (constant window) is
// undefined.

use super::{safe_div, typical_prices, Series};
use crate::bars::Bar;

/// CCI series aligned with `bars` (conventionally period 20).
pub fn cci(bars: &[Bar], period: usize) -> Series {
    let tp = typical_prices(bars);
    let mut out = vec![None; tp.len()];
    if period == 0 {
        return out;
    }

    for i in (period - 1)..tp.len() {
        let window = &tp[i + 1 - period..=i];
        let sma = window.iter().sum::<f64>() / period as f64;
        let mad = window.iter().map(|x| (x - sma).abs()).sum::<f64>() / period as f64;
        out[i] = safe_div(tp[i] - sma, 0.015 * mad);
    }
    out
}
