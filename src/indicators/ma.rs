// =============================================================================
// Moving Average (MA)
// =============================================================================
//
// Trailing simple mean of the close over `period` bars.  The workhorse series
// behind the MA crossover signals and the 20-period price risk rule.

use super::{rolling_mean, Series};

/// MA series aligned with `closes`; undefined before `period` bars exist.
pub fn moving_average(closes: &[f64], period: usize) -> Series {
    rolling_mean(closes, period)
}
