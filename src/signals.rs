// =============================================================================
// Signal Detector — discrete crossover and threshold events
// =============================================================================
//
// Scans the most recent window of bars for transitions, each checked strictly
// between consecutive bars i-1 and i:
//   - RSI crossing above 70 (overbought) or below 30 (oversold)
//   - MACD diff line crossing the signal line (golden / dead cross)
//   - MA(5) crossing MA(10) (golden / dead cross)
//
// A crossing requires both endpoints to be defined; undefined endpoints never
// fire.  Several kinds may fire on the same bar.  Output is chronological.

use serde::{Deserialize, Serialize};

use crate::bars::{format_timestamp, Bar};
use crate::indicators::{closes, ma::moving_average, macd::macd, rsi::rsi, Series};

const RSI_PERIOD: usize = 14;
const OVERBOUGHT: f64 = 70.0;
const OVERSOLD: f64 = 30.0;

/// The event kinds the detector can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    #[serde(rename = "RSI_OVERBOUGHT")]
    RsiOverbought,
    #[serde(rename = "RSI_OVERSOLD")]
    RsiOversold,
    #[serde(rename = "MACD_GOLDEN_CROSS")]
    MacdGoldenCross,
    #[serde(rename = "MACD_DEAD_CROSS")]
    MacdDeadCross,
    #[serde(rename = "MA_GOLDEN_CROSS")]
    MaGoldenCross,
    #[serde(rename = "MA_DEAD_CROSS")]
    MaDeadCross,
}

/// One detected event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub date: String,
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub description: String,
}

/// Detect signals over the trailing `window` bars of the series.
pub fn detect_signals(bars: &[Bar], window: usize) -> Vec<Signal> {
    let closes = closes(bars);
    let rsi = rsi(&closes, RSI_PERIOD);
    let macd = macd(&closes, 12, 26, 9);
    let ma5 = moving_average(&closes, 5);
    let ma10 = moving_average(&closes, 10);

    let start = bars.len().saturating_sub(window).max(1);

    let mut signals = Vec::new();
    for i in start..bars.len() {
        let date = format_timestamp(bars[i].timestamp);

        if let Some((prev, cur)) = defined_pair(&rsi, i) {
            if cur > OVERBOUGHT && prev <= OVERBOUGHT {
                signals.push(Signal {
                    date: date.clone(),
                    kind: SignalKind::RsiOverbought,
                    description: format!("RSI(14) crossed above 70, now {cur:.2}"),
                });
            } else if cur < OVERSOLD && prev >= OVERSOLD {
                signals.push(Signal {
                    date: date.clone(),
                    kind: SignalKind::RsiOversold,
                    description: format!("RSI(14) crossed below 30, now {cur:.2}"),
                });
            }
        }

        match crossing(&macd.diff, &macd.signal, i) {
            Some(Crossing::Upward) => signals.push(Signal {
                date: date.clone(),
                kind: SignalKind::MacdGoldenCross,
                description: "DIFF crossed above DEA".to_string(),
            }),
            Some(Crossing::Downward) => signals.push(Signal {
                date: date.clone(),
                kind: SignalKind::MacdDeadCross,
                description: "DIFF crossed below DEA".to_string(),
            }),
            None => {}
        }

        match crossing(&ma5, &ma10, i) {
            Some(Crossing::Upward) => signals.push(Signal {
                date: date.clone(),
                kind: SignalKind::MaGoldenCross,
                description: "MA5 crossed above MA10".to_string(),
            }),
            Some(Crossing::Downward) => signals.push(Signal {
                date,
                kind: SignalKind::MaDeadCross,
                description: "MA5 crossed below MA10".to_string(),
            }),
            None => {}
        }
    }
    signals
}

enum Crossing {
    Upward,
    Downward,
}

/// Detect `a` crossing `b` between bars i-1 and i; all four endpoints must be
/// defined.
fn crossing(a: &Series, b: &Series, i: usize) -> Option<Crossing> {
    let (pa, ca) = defined_pair(a, i)?;
    let (pb, cb) = defined_pair(b, i)?;
    if ca > cb && pa <= pb {
        Some(Crossing::Upward)
    } else if ca < cb && pa >= pb {
        Some(Crossing::Downward)
    } else {
        None
    }
}

fn defined_pair(series: &Series, i: usize) -> Option<(f64, f64)> {
    Some((series[i - 1]?, series[i]?))
}
