// =============================================================================
// Report Assembly — timeframe orchestration and output shaping
// =============================================================================
//
// Runs the full pipeline (normalize -> indicators -> signals / anomalies /
// warnings -> support/resistance) independently for each supplied timeframe
// and assembles the combined report.  One timeframe failing leaves its key
// absent without aborting the others; the request only fails when nothing
// succeeds.
//
// Output shaping details live here and nowhere else: rounding to display
// precision, date formatting, and the legacy top-level mirror of the "day"
// timeframe.  The computation core stays rounding-free.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::anomalies::{detect_anomalies, Anomaly};
use crate::bars::{format_timestamp, normalize, Bar};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::indicators::adx::{adx, Adx};
use crate::indicators::atr::atr;
use crate::indicators::bollinger::{bollinger_bands, BollingerBands};
use crate::indicators::cci::cci;
use crate::indicators::kdj::{kdj, Kdj};
use crate::indicators::ma::moving_average;
use crate::indicators::macd::{macd, Macd};
use crate::indicators::mfi::mfi;
use crate::indicators::obv::obv;
use crate::indicators::rsi::rsi;
use crate::indicators::{closes, Series};
use crate::risk::risk_warnings;
use crate::signals::{detect_signals, Signal};
use crate::timeframe::Timeframe;

// ---------------------------------------------------------------------------
// Display rounding
// ---------------------------------------------------------------------------

/// Two-decimal display rounding, applied only at assembly time.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Four-decimal rounding for the MACD family, whose values live close to zero.
pub(crate) fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

// ---------------------------------------------------------------------------
// Input boundary
// ---------------------------------------------------------------------------

/// The two accepted input shapes: a flat bar array (implicitly "day") or an
/// object keyed by timeframe label.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InputPayload {
    Series(Vec<Value>),
    ByTimeframe(TimeframeSeries),
}

/// Bar series keyed by timeframe label; any subset may be present.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeframeSeries {
    #[serde(default)]
    pub day: Option<Vec<Value>>,
    #[serde(default, rename = "60m")]
    pub m60: Option<Vec<Value>>,
    #[serde(default, rename = "5m")]
    pub m5: Option<Vec<Value>>,
}

impl TimeframeSeries {
    fn series(&self, timeframe: Timeframe) -> Option<&[Value]> {
        match timeframe {
            Timeframe::Day => self.day.as_deref(),
            Timeframe::Min60 => self.m60.as_deref(),
            Timeframe::Min5 => self.m5.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output document
// ---------------------------------------------------------------------------

/// Rounded indicator values at one bar.  Undefined indicators are omitted
/// from the serialized document entirely.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndicatorValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma5: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma10: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma20: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma60: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_signal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_hist: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger_upper: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger_middle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger_lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kdj_k: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kdj_d: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kdj_j: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plus_di: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minus_di: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obv: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cci: Option<f64>,
}

/// The latest bar's price, volume and indicator values.
#[derive(Debug, Clone, Serialize)]
pub struct Latest {
    pub close: f64,
    pub volume: f64,
    #[serde(flatten)]
    pub indicators: IndicatorValues,
}

/// One dated entry of the recent-history slice.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSnapshot {
    pub date: String,
    pub close: f64,
    pub volume: f64,
    #[serde(flatten)]
    pub indicators: IndicatorValues,
}

/// 20-period support and resistance levels.
#[derive(Debug, Clone, Serialize)]
pub struct SupportResistance {
    pub period20: PeriodLevels,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodLevels {
    pub support: f64,
    pub resistance: f64,
}

/// Everything the engine derives for one timeframe.
#[derive(Debug, Clone, Serialize)]
pub struct TimeframeResult {
    pub latest: Latest,
    #[serde(rename = "supportResistance")]
    pub support_resistance: SupportResistance,
    pub signals: Vec<Signal>,
    pub anomalies: Vec<Anomaly>,
    #[serde(rename = "riskWarnings")]
    pub risk_warnings: Vec<String>,
    pub recent: Vec<IndicatorSnapshot>,
}

/// Per-timeframe results under their wire labels; absent timeframes are
/// omitted from the document.
#[derive(Debug, Default, Serialize)]
pub struct Timeframes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<TimeframeResult>,
    #[serde(rename = "60m", skip_serializing_if = "Option::is_none")]
    pub m60: Option<TimeframeResult>,
    #[serde(rename = "5m", skip_serializing_if = "Option::is_none")]
    pub m5: Option<TimeframeResult>,
}

impl Timeframes {
    fn set(&mut self, timeframe: Timeframe, result: TimeframeResult) {
        match timeframe {
            Timeframe::Day => self.day = Some(result),
            Timeframe::Min60 => self.m60 = Some(result),
            Timeframe::Min5 => self.m5 = Some(result),
        }
    }

    fn is_empty(&self) -> bool {
        self.day.is_none() && self.m60.is_none() && self.m5.is_none()
    }
}

/// The combined report.  When a "day" timeframe is present its latest values
/// and recent history are mirrored at the top level for consumers of the old
/// single-timeframe shape.
#[derive(Debug, Serialize)]
pub struct Report {
    pub timeframes: Timeframes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<Latest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent: Option<Vec<IndicatorSnapshot>>,
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
}

/// The failure document: the only alternative to a well-formed report.
#[derive(Debug, Serialize)]
pub struct ErrorDocument {
    pub error: String,
    pub message: String,
}

impl ErrorDocument {
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self {
            error: "technical analysis failed".to_string(),
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Indicator set
// ---------------------------------------------------------------------------

/// Every indicator series for one bar series, computed once and sampled per
/// output position.
struct IndicatorSet {
    ma5: Series,
    ma10: Series,
    ma20: Series,
    ma60: Series,
    rsi: Series,
    macd: Macd,
    bands: BollingerBands,
    kdj: Kdj,
    atr: Series,
    adx: Adx,
    obv: Series,
    mfi: Series,
    cci: Series,
}

impl IndicatorSet {
    fn compute(bars: &[Bar]) -> Self {
        let closes = closes(bars);
        Self {
            ma5: moving_average(&closes, 5),
            ma10: moving_average(&closes, 10),
            ma20: moving_average(&closes, 20),
            ma60: moving_average(&closes, 60),
            rsi: rsi(&closes, 14),
            macd: macd(&closes, 12, 26, 9),
            bands: bollinger_bands(&closes, 20, 2.0),
            kdj: kdj(bars, 9, 3, 3),
            atr: atr(bars, 14),
            adx: adx(bars, 14),
            obv: obv(bars),
            mfi: mfi(bars, 14),
            cci: cci(bars, 20),
        }
    }

    fn values_at(&self, i: usize) -> IndicatorValues {
        IndicatorValues {
            ma5: self.ma5[i].map(round2),
            ma10: self.ma10[i].map(round2),
            ma20: self.ma20[i].map(round2),
            ma60: self.ma60[i].map(round2),
            rsi: self.rsi[i].map(round2),
            macd: self.macd.diff[i].map(round4),
            macd_signal: self.macd.signal[i].map(round4),
            macd_hist: self.macd.histogram[i].map(round4),
            bollinger_upper: self.bands.upper[i].map(round2),
            bollinger_middle: self.bands.middle[i].map(round2),
            bollinger_lower: self.bands.lower[i].map(round2),
            kdj_k: self.kdj.k[i].map(round2),
            kdj_d: self.kdj.d[i].map(round2),
            kdj_j: self.kdj.j[i].map(round2),
            atr: self.atr[i].map(round2),
            adx: self.adx.adx[i].map(round2),
            plus_di: self.adx.plus_di[i].map(round2),
            minus_di: self.adx.minus_di[i].map(round2),
            obv: self.obv[i].map(round2),
            mfi: self.mfi[i].map(round2),
            cci: self.cci[i].map(round2),
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Run the engine over every supplied timeframe and assemble the report.
///
/// # Errors
/// Returns the last per-timeframe error only when at least one series was
/// supplied and none of them produced a result.
pub fn analyze(payload: &InputPayload, config: &AnalysisConfig) -> Result<Report, AnalysisError> {
    let mut supplied: Vec<(Timeframe, &[Value])> = Vec::new();
    match payload {
        InputPayload::Series(records) => supplied.push((Timeframe::Day, records)),
        InputPayload::ByTimeframe(series) => {
            for timeframe in Timeframe::ALL {
                if let Some(records) = series.series(timeframe) {
                    supplied.push((timeframe, records));
                }
            }
        }
    }

    let mut timeframes = Timeframes::default();
    let mut last_error = None;
    for (timeframe, records) in &supplied {
        match analyze_timeframe(records, *timeframe, config) {
            Ok(result) => {
                debug!(timeframe = %timeframe, "timeframe analysis complete");
                timeframes.set(*timeframe, result);
            }
            Err(e) => {
                warn!(timeframe = %timeframe, error = %e, "timeframe analysis failed");
                last_error = Some(e);
            }
        }
    }

    if timeframes.is_empty() {
        if let Some(e) = last_error {
            return Err(e);
        }
    }

    let (latest, recent) = match &timeframes.day {
        Some(day) => (Some(day.latest.clone()), Some(day.recent.clone())),
        None => (None, None),
    };

    Ok(Report {
        timeframes,
        latest,
        recent,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}

/// Full pipeline for a single timeframe.
pub fn analyze_timeframe(
    records: &[Value],
    timeframe: Timeframe,
    config: &AnalysisConfig,
) -> Result<TimeframeResult, AnalysisError> {
    let bars = normalize(records, config.max_bars)?;
    let set = IndicatorSet::compute(&bars);

    let last = bars.len() - 1;
    let latest = Latest {
        close: round2(bars[last].close),
        volume: round2(bars[last].volume),
        indicators: set.values_at(last),
    };

    let recent_start = bars.len().saturating_sub(timeframe.recent_len());
    let recent = (recent_start..bars.len())
        .map(|i| IndicatorSnapshot {
            date: format_timestamp(bars[i].timestamp),
            close: round2(bars[i].close),
            volume: round2(bars[i].volume),
            indicators: set.values_at(i),
        })
        .collect();

    Ok(TimeframeResult {
        latest,
        support_resistance: support_resistance(&bars, 20),
        signals: detect_signals(&bars, timeframe.signal_window()),
        anomalies: detect_anomalies(&bars, config),
        risk_warnings: risk_warnings(&bars, config),
        recent,
    })
}

/// Lowest low / highest high over the trailing `period` bars (or the whole
/// series when shorter).
fn support_resistance(bars: &[Bar], period: usize) -> SupportResistance {
    let tail = &bars[bars.len().saturating_sub(period)..];
    let support = tail.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let resistance = tail.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    SupportResistance {
        period20: PeriodLevels {
            support: round2(support),
            resistance: round2(resistance),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(d: &str, o: f64, c: f64, h: f64, l: f64, v: f64) -> Value {
        json!({ "d": d, "o": o, "c": c, "h": h, "l": l, "v": v })
    }

    fn day_string(i: usize) -> String {
        let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (base + chrono::Days::new(i as u64))
            .format("%Y-%m-%d")
            .to_string()
    }

    /// 30 daily bars, close strictly rising 0.1 per bar from 10.0, flat
    /// volume 1,000,000.
    fn rising_series() -> Vec<Value> {
        (0..30)
            .map(|i| {
                let close = 10.0 + i as f64 * 0.1;
                record(
                    &day_string(i),
                    close - 0.05,
                    close,
                    close + 0.1,
                    close - 0.1,
                    1_000_000.0,
                )
            })
            .collect()
    }

    #[test]
    fn rising_series_end_to_end() {
        let result = analyze_timeframe(
            &rising_series(),
            Timeframe::Day,
            &AnalysisConfig::default(),
        )
        .unwrap();

        // MA(5), MA(10), MA(20) all defined and increasing across the recent
        // slice.
        assert_eq!(result.recent.len(), 5);
        let mas: [fn(&IndicatorValues) -> Option<f64>; 3] =
            [|v| v.ma5, |v| v.ma10, |v| v.ma20];
        for pair in result.recent.windows(2) {
            for f in mas {
                let a = f(&pair[0].indicators).unwrap();
                let b = f(&pair[1].indicators).unwrap();
                assert!(b > a, "expected increasing MA, got {a} then {b}");
            }
        }

        // RSI pinned at its upper bound on a monotone rise.
        assert_eq!(result.latest.indicators.rsi, Some(100.0));

        // No dead crosses in the window, no anomalies on flat volume.
        assert!(result
            .signals
            .iter()
            .all(|s| s.kind != crate::signals::SignalKind::MacdDeadCross));
        assert!(result.anomalies.is_empty());

        // Support and resistance bracket the closes.
        let sr = &result.support_resistance.period20;
        assert!(sr.support < sr.resistance);
        assert!(sr.support <= result.latest.close && result.latest.close <= sr.resistance);

        // MA60 needs 60 bars and must be absent, not zero.
        assert_eq!(result.latest.indicators.ma60, None);
        let latest_json = serde_json::to_value(&result.latest).unwrap();
        assert!(latest_json.get("ma60").is_none());
        assert!(latest_json.get("ma20").is_some());
    }

    #[test]
    fn rounding_precision_by_family() {
        let result = analyze_timeframe(
            &rising_series(),
            Timeframe::Day,
            &AnalysisConfig::default(),
        )
        .unwrap();

        let ma5 = result.latest.indicators.ma5.unwrap();
        assert!((ma5 * 100.0 - (ma5 * 100.0).round()).abs() < 1e-9);

        let macd = result.latest.indicators.macd.unwrap();
        assert!((macd * 10_000.0 - (macd * 10_000.0).round()).abs() < 1e-9);
    }

    #[test]
    fn multi_timeframe_report_keys() {
        let payload = InputPayload::ByTimeframe(TimeframeSeries {
            day: Some(rising_series()),
            m60: Some(rising_series()),
            m5: None,
        });
        let report = analyze(&payload, &AnalysisConfig::default()).unwrap();
        let doc = serde_json::to_value(&report).unwrap();

        assert!(doc["timeframes"].get("day").is_some());
        assert!(doc["timeframes"].get("60m").is_some());
        assert!(doc["timeframes"].get("5m").is_none());

        // "day" present: top-level mirror of latest and recent.
        assert_eq!(doc["latest"], doc["timeframes"]["day"]["latest"]);
        assert_eq!(doc["recent"], doc["timeframes"]["day"]["recent"]);
    }

    #[test]
    fn no_day_means_no_top_level_mirror() {
        let payload = InputPayload::ByTimeframe(TimeframeSeries {
            day: None,
            m60: Some(rising_series()),
            m5: None,
        });
        let report = analyze(&payload, &AnalysisConfig::default()).unwrap();
        let doc = serde_json::to_value(&report).unwrap();
        assert!(doc.get("latest").is_none());
        assert!(doc.get("recent").is_none());
        assert!(doc["timeframes"].get("60m").is_some());
    }

    #[test]
    fn flat_array_is_treated_as_day() {
        let payload = InputPayload::Series(rising_series());
        let report = analyze(&payload, &AnalysisConfig::default()).unwrap();
        assert!(report.timeframes.day.is_some());
        assert!(report.latest.is_some());
    }

    #[test]
    fn failed_timeframe_is_absent_not_partial() {
        let payload = InputPayload::ByTimeframe(TimeframeSeries {
            day: Some(vec![]), // fails with EmptySeries
            m60: Some(rising_series()),
            m5: None,
        });
        let report = analyze(&payload, &AnalysisConfig::default()).unwrap();
        assert!(report.timeframes.day.is_none());
        assert!(report.timeframes.m60.is_some());
        // No "day", so no mirror either.
        assert!(report.latest.is_none());
    }

    #[test]
    fn all_timeframes_failing_fails_the_request() {
        let payload = InputPayload::Series(vec![]);
        assert_eq!(
            analyze(&payload, &AnalysisConfig::default()).unwrap_err(),
            AnalysisError::EmptySeries
        );
    }

    #[test]
    fn object_without_recognized_keys_yields_empty_report() {
        let payload: InputPayload =
            serde_json::from_value(json!({ "week": [] })).unwrap();
        let report = analyze(&payload, &AnalysisConfig::default()).unwrap();
        let doc = serde_json::to_value(&report).unwrap();
        assert_eq!(doc["timeframes"], json!({}));
        assert!(doc.get("latest").is_none());
    }

    #[test]
    fn scalar_input_is_not_a_valid_shape() {
        assert!(serde_json::from_value::<InputPayload>(json!(42)).is_err());
        assert!(serde_json::from_value::<InputPayload>(json!("bars")).is_err());
    }

    #[test]
    fn analysis_is_idempotent_modulo_timestamp() {
        let payload = InputPayload::Series(rising_series());
        let a = analyze(&payload, &AnalysisConfig::default()).unwrap();
        let b = analyze(&payload, &AnalysisConfig::default()).unwrap();
        let mut a = serde_json::to_value(&a).unwrap();
        let mut b = serde_json::to_value(&b).unwrap();
        a.as_object_mut().unwrap().remove("generatedAt");
        b.as_object_mut().unwrap().remove("generatedAt");
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_records_shrink_the_series() {
        // Four good bars and one with low above both open and close.
        let mut records: Vec<Value> = (0..4)
            .map(|i| record(&day_string(i), 10.0, 10.5, 10.6, 9.9, 1000.0))
            .collect();
        records.push(json!({
            "d": day_string(4), "o": 10.0, "c": 10.5, "h": 10.6, "l": 10.2, "v": 1000.0
        }));

        let result =
            analyze_timeframe(&records, Timeframe::Day, &AnalysisConfig::default()).unwrap();
        // recent would hold 5 snapshots if all records had survived.
        assert_eq!(result.recent.len(), 4);
    }

    #[test]
    fn anomaly_requires_a_full_trailing_window() {
        // One bar with a huge hypothetical ratio: no trailing average exists,
        // so nothing may fire.
        let records = vec![record(&day_string(0), 10.0, 10.5, 10.6, 9.9, 1_000_000.0)];
        let result =
            analyze_timeframe(&records, Timeframe::Day, &AnalysisConfig::default()).unwrap();
        assert!(result.anomalies.is_empty());

        // With 21+ bars the detector does fire on a joint spike.
        let mut records: Vec<Value> = (0..25)
            .map(|i| record(&day_string(i), 10.0, 10.0, 10.1, 9.9, 1000.0))
            .collect();
        records.push(record(&day_string(25), 10.0, 10.6, 10.7, 9.9, 10_000.0));
        let result =
            analyze_timeframe(&records, Timeframe::Day, &AnalysisConfig::default()).unwrap();
        assert_eq!(result.anomalies.len(), 1);
    }

    #[test]
    fn intraday_timeframes_use_longer_recent_slices() {
        let records: Vec<Value> = (0..60)
            .map(|i| {
                let ts = format!("2024-01-02 {:02}:{:02}", 9 + i / 12, (i % 12) * 5);
                record(&ts, 10.0, 10.0 + i as f64 * 0.01, 10.8, 9.9, 1000.0)
            })
            .collect();
        let result =
            analyze_timeframe(&records, Timeframe::Min5, &AnalysisConfig::default()).unwrap();
        assert_eq!(result.recent.len(), 48);
        assert!(result.recent[0].date.contains(':'));
    }
}
