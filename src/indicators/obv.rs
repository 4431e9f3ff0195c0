// =============================================================================
// On-Balance Volume (OBV)
// =============================================================================
//
// Cumulative sum of signed volume: volume counts positive when the close
// rises, negative when it falls, and not at all on an unchanged close.  The
// first bar has no previous close and contributes 0, so OBV is defined from
// the very first position.

use super::Series;
use crate::bars::Bar;

/// OBV series aligned with `bars`; always fully defined.
pub fn obv(bars: &[Bar]) -> Series {
    let mut out = Vec::with_capacity(bars.len());
    let mut total = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            let delta = bar.close - bars[i - 1].close;
            if delta > 0.0 {
                total += bar.volume;
            } else if delta < 0.0 {
                total -= bar.volume;
            }
        }
        out.push(Some(total));
    }
    out
}
