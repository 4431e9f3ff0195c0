// =============================================================================
// Money Flow Index (MFI)
// =============================================================================
//
// money flow = typical price * volume, classed positive or negative by the
// typical-price delta.  The ratio of trailing positive to trailing negative
// flow over `period` bars maps into [0, 100] the same way RSI maps RS.
//
// Deltas need a previous bar, so the series is undefined before `period + 1`
// bars; a window with zero negative flow is undefined.

use super::{rolling_sum_opt, typical_prices, Series};
use crate::bars::Bar;

/// MFI series aligned with `bars` (conventionally period 14).
pub fn mfi(bars: &[Bar], period: usize) -> Series {
    let n = bars.len();
    let tp = typical_prices(bars);

    let mut positive: Vec<Option<f64>> = vec![None; n];
    let mut negative: Vec<Option<f64>> = vec![None; n];
    for i in 1..n {
        let flow = tp[i] * bars[i].volume;
        let delta = tp[i] - tp[i - 1];
        positive[i] = Some(if delta > 0.0 { flow } else { 0.0 });
        negative[i] = Some(if delta < 0.0 { flow } else { 0.0 });
    }

    let pos_sum = rolling_sum_opt(&positive, period);
    let neg_sum = rolling_sum_opt(&negative, period);

    pos_sum
        .iter()
        .zip(neg_sum.iter())
        .map(|pair| match pair {
            (Some(pos), Some(neg)) => {
                if *neg == 0.0 {
                    None
                } else {
                    Some(100.0 - 100.0 / (1.0 + pos / neg))
                }
            }
            _ => None,
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, price: f64, volume: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .checked_add_days(chrono::Days::new(day as u64))
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: price,
            close: price,
            high: price + 1.0,
            low: price - 1.0,
            volume,
            turnover: 0.0,
        }
    }

    fn alternating_bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let price = if i % 2 == 0 { 100.0 } else { 103.0 };
                bar(i as u32, price + i as f64 * 0.01, 1000.0)
            })
            .collect()
    }

    #[test]
    fn undefined_before_lookback() {
        let bars = alternating_bars(30);
        let out = mfi(&bars, 14);
        assert!(out[..14].iter().all(|v| v.is_none()));
        assert!(out[14].is_some());
    }

    #[test]
    fn bounded_in_0_100() {
        let bars = alternating_bars(40);
        for v in mfi(&bars, 14).iter().flatten() {
            assert!((0.0..=100.0).contains(v), "MFI {v} out of range");
        }
    }

    #[test]
    fn zero_negative_flow_is_undefined() {
        // Strictly rising typical price: every delta positive.
        let bars: Vec<Bar> = (0..30).map(|i| bar(i, 100.0 + i as f64, 1000.0)).collect();
        assert!(mfi(&bars, 14).iter().all(|v| v.is_none()));
    }

    #[test]
    fn balanced_flow_sits_midrange() {
        // Equal up and down flows keep the ratio near 1 and MFI near 50.
        let bars = alternating_bars(40);
        let last = mfi(&bars, 14).last().unwrap().unwrap();
        assert!((30.0..=70.0).contains(&last), "expected midrange, got {last}");
    }
}
