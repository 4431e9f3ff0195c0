// =============================================================================
// Average Directional Index (ADX) — simplified trailing-mean smoothing
// =============================================================================
//
// +DM = up-move   when it exceeds the down-move and is positive, else 0
// -DM = down-move when it exceeds the up-move and is positive, else 0
// +DI = 100 * trailing sum(+DM, n) / trailing mean(TR, n)
// -DI = 100 * trailing sum(-DM, n) / trailing mean(TR, n)
// DX  = 100 * |+DI - -DI| / (+DI + -DI)
// ADX = trailing mean(DX, n)
//
// This deliberately uses plain trailing means instead of Wilder's recursive
// smoothing; downstream consumers depend on the simplified values.  First
// defined ADX position needs 2n bars.

use super::atr::true_range;
use super::{rolling_mean_opt, rolling_sum_opt, safe_div, Series};
use crate::bars::Bar;

/// ADX plus the two directional-indicator series, aligned with the bars.
#[derive(Debug, Clone)]
pub struct Adx {
    pub adx: Series,
    pub plus_di: Series,
    pub minus_di: Series,
}

/// Compute the simplified ADX (conventionally period 14).
pub fn adx(bars: &[Bar], period: usize) -> Adx {
    let n = bars.len();
    let mut plus_dm: Vec<Option<f64>> = vec![None; n];
    let mut minus_dm: Vec<Option<f64>> = vec![None; n];
    for i in 1..n {
        let up_move = bars[i].high - bars[i - 1].high;
        let down_move = bars[i - 1].low - bars[i].low;
        plus_dm[i] = Some(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm[i] = Some(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
    }

    let atr = rolling_mean_opt(&true_range(bars), period);
    let plus_sum = rolling_sum_opt(&plus_dm, period);
    let minus_sum = rolling_sum_opt(&minus_dm, period);

    let di = |sum: &Series| -> Series {
        sum.iter()
            .zip(atr.iter())
            .map(|pair| match pair {
                (Some(s), Some(a)) => safe_div(*s, *a).map(|r| r * 100.0),
                _ => None,
            })
            .collect()
    };
    let plus_di = di(&plus_sum);
    let minus_di = di(&minus_sum);

    let dx: Series = plus_di
        .iter()
        .zip(minus_di.iter())
        .map(|pair| match pair {
            (Some(p), Some(m)) => safe_div((p - m).abs(), p + m).map(|r| r * 100.0),
            _ => None,
        })
        .collect();

    Adx {
        adx: rolling_mean_opt(&dx, period),
        plus_di,
        minus_di,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .checked_add_days(chrono::Days::new(day as u64))
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open,
            close,
            high,
            low,
            volume: 1000.0,
            turnover: 0.0,
        }
    }

    fn trending_bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                bar(i as u32, base, base + 1.5, base - 0.5, base + 1.0)
            })
            .collect()
    }

    #[test]
    fn defined_from_two_periods() {
        let bars = trending_bars(40);
        let out = adx(&bars, 14);
        // DI needs 14 DM values (first at bar 1), DX mean needs 14 more.
        assert!(out.plus_di[..14].iter().all(|v| v.is_none()));
        assert!(out.plus_di[14].is_some());
        assert!(out.adx[..27].iter().all(|v| v.is_none()));
        assert!(out.adx[27].is_some());
    }

    #[test]
    fn strong_uptrend_maxes_the_index() {
        // Higher highs with no down-moves: -DM is always 0, so DX == 100.
        let bars = trending_bars(60);
        let out = adx(&bars, 14);
        let last_adx = out.adx.last().unwrap().unwrap();
        assert!(
            (last_adx - 100.0).abs() < 1e-9,
            "expected ADX 100 for pure uptrend, got {last_adx}"
        );
        assert_eq!(out.minus_di.last().unwrap().unwrap(), 0.0);
        assert!(out.plus_di.last().unwrap().unwrap() > 0.0);
    }

    #[test]
    fn flat_market_is_undefined() {
        // Identical bars: +DM = -DM = 0, so DX divides 0 by 0.
        let bars: Vec<Bar> = (0..60).map(|i| bar(i, 100.0, 101.0, 99.0, 100.0)).collect();
        let out = adx(&bars, 14);
        assert!(out.adx.iter().all(|v| v.is_none()));
    }

    #[test]
    fn values_within_0_100() {
        let bars: Vec<Bar> = (0..100)
            .map(|i| {
                let base = 50.0 + (i as f64 * 0.3).sin() * 10.0;
                bar(i, base - 0.5, base + 1.0, base - 1.0, base + 0.5)
            })
            .collect();
        let out = adx(&bars, 14);
        for v in out.adx.iter().flatten() {
            assert!((0.0..=100.0).contains(v), "ADX {v} out of range");
        }
    }
}
