// =============================================================================
// Bollinger Bands
// =============================================================================
//
// middle = MA(close, period)
// upper  = middle + num_std * trailing sample stdev(period)
// lower  = middle - num_std * trailing sample stdev(period)

use super::{rolling_mean, rolling_std, Series};

/// The three band series, aligned with the input closes.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

/// Compute Bollinger Bands (conventionally period 20, num_std 2).
pub fn bollinger_bands(closes: &[f64], period: usize, num_std: f64) -> BollingerBands {
    let middle = rolling_mean(closes, period);
    let std = rolling_std(closes, period);

    let upper: Series = middle
        .iter()
        .zip(std.iter())
        .map(|pair| match pair {
            (Some(m), Some(s)) => Some(m + num_std * s),
            _ => None,
        })
        .collect();
    let lower: Series = middle
        .iter()
        .zip(std.iter())
        .map(|pair| match pair {
            (Some(m), Some(s)) => Some(m - num_std * s),
            _ => None,
        })
        .collect();

    BollingerBands {
        upper,
        middle,
        lower,
    }
}
