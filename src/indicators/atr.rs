// =============================================================================
// Average True Range (ATR)
// =============================================================================
//
// True Range per bar:
//   TR = max(high - low, |high - prevClose|, |low - prevClose|)
//
// TR needs a previous close, so it is undefined at position 0 and ATR — the
// trailing mean of TR over `period` bars — is defined from bar `period + 1`
// onward.

use super::{rolling_mean_opt, Series};
use crate::bars::Bar;

/// True Range series aligned with `bars`; undefined at position 0.
pub fn true_range(bars: &[Bar]) -> Series {
    let mut out = vec![None; bars.len()];
    for i in 1..bars.len() {
        let prev_close = bars[i - 1].close;
        let hl = bars[i].high - bars[i].low;
        let hc = (bars[i].high - prev_close).abs();
        let lc = (bars[i].low - prev_close).abs();
        out[i] = Some(hl.max(hc).max(lc));
    }
    out
}

/// ATR series aligned with `bars` (conventionally period 14).
pub fn atr(bars: &[Bar], period: usize) -> Series {
    rolling_mean_opt(&true_range(bars), period)
}
