// =============================================================================
// Bar validation and normalization
// =============================================================================
//
// Raw bar records arrive as loosely-typed JSON: short field names, numbers
// that may be strings, entries that may be malformed.  This module converts
// them into a strictly-typed, chronologically ordered `Bar` series as early
// as possible so that every downstream component operates on data whose
// invariants already hold.
//
// Per-record problems are recovered locally: the offending record is dropped
// with a warning, never failing the batch.  Only an empty result is an error.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A numeric field that may arrive as a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(f64),
    Text(String),
}

impl NumericField {
    /// Coerce to `f64`, rejecting non-numeric text and non-finite values.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// One raw bar record as sent by the upstream collaborator.
///
/// All fields are optional at the wire level; `validate` decides which
/// records survive.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBar {
    #[serde(default)]
    pub d: Option<String>,
    #[serde(default)]
    pub o: Option<NumericField>,
    #[serde(default)]
    pub c: Option<NumericField>,
    #[serde(default)]
    pub h: Option<NumericField>,
    #[serde(default)]
    pub l: Option<NumericField>,
    #[serde(default)]
    pub v: Option<NumericField>,
    /// Turnover (traded value).  Optional; defaults to 0 when absent.
    #[serde(default)]
    pub tu: Option<NumericField>,
}

// ---------------------------------------------------------------------------
// Internal type
// ---------------------------------------------------------------------------

/// One validated OHLCV observation.
///
/// Invariants (enforced at construction): all prices positive,
/// `high >= max(open, close)`, `low <= min(open, close)`, `volume >= 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub turnover: f64,
}

// ---------------------------------------------------------------------------
// Timestamp handling
// ---------------------------------------------------------------------------

/// Parse a bar timestamp.  Date-only values map to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Render a bar timestamp for the report: date-only for daily bars,
/// date + time for intraday bars.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    if ts.hour() == 0 && ts.minute() == 0 && ts.second() == 0 {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M").to_string()
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Fewer usable bars than this triggers a reliability warning (the engine
/// still proceeds; long-lookback indicators simply stay undefined).
const MIN_RELIABLE_BARS: usize = 20;

/// Clean a raw record batch into a validated, chronologically ordered,
/// deduplicated `Bar` series.
///
/// Pipeline: cap to the most recent `max_bars` records, validate each record
/// (dropping failures with a warning), stable-sort by timestamp, collapse
/// duplicate timestamps keeping the later occurrence.
///
/// # Errors
/// `AnalysisError::EmptySeries` when no record survives validation.
pub fn normalize(records: &[Value], max_bars: usize) -> Result<Vec<Bar>, AnalysisError> {
    let capped = if records.len() > max_bars {
        warn!(
            total = records.len(),
            max_bars, "oversized bar series, truncating to the most recent entries"
        );
        &records[records.len() - max_bars..]
    } else {
        records
    };

    let mut bars: Vec<Bar> = Vec::with_capacity(capped.len());
    for (i, record) in capped.iter().enumerate() {
        match validate(record) {
            Some(bar) => bars.push(bar),
            None => warn!(index = i, "malformed bar record dropped"),
        }
    }

    if bars.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }
    if bars.len() < MIN_RELIABLE_BARS {
        warn!(
            usable = bars.len(),
            "short bar series, long-lookback indicators will be undefined"
        );
    }

    // sort_by_key is stable, so equal timestamps keep their input order and
    // the dedup below sees the later record last.
    bars.sort_by_key(|b| b.timestamp);

    let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => deduped.push(bar),
        }
    }

    Ok(deduped)
}

/// Validate a single raw record.  `None` means the record is dropped.
fn validate(record: &Value) -> Option<Bar> {
    let raw: RawBar = serde_json::from_value(record.clone()).ok()?;

    let timestamp = parse_timestamp(raw.d.as_deref()?)?;
    let open = raw.o?.as_f64()?;
    let close = raw.c?.as_f64()?;
    let high = raw.h?.as_f64()?;
    let low = raw.l?.as_f64()?;
    let volume = raw.v?.as_f64()?;
    let turnover = raw.tu.and_then(|t| t.as_f64()).unwrap_or(0.0);

    if open <= 0.0 || close <= 0.0 || high <= 0.0 || low <= 0.0 {
        return None;
    }
    if high < open.max(close) || low > open.min(close) {
        return None;
    }
    if volume < 0.0 {
        return None;
    }

    Some(Bar {
        timestamp,
        open,
        close,
        high,
        low,
        volume,
        turnover,
    })
}
