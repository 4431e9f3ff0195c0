// =============================================================================
// Error taxonomy for the analysis engine
// =============================================================================
//
// Per-record problems (missing fields, bad prices) are absorbed at the
// validation boundary and never surface here.  A failing timeframe drops out
// of the report; only a structurally invalid request is fatal.

use thiserror::Error;

/// Failures the engine can report to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// No usable bars survived validation for a timeframe.
    #[error("no usable bars after validation")]
    EmptySeries,

    /// The top-level input was neither a bar array nor a timeframe mapping.
    #[error("unsupported input shape: expected a bar array or an object keyed by day/60m/5m")]
    UnsupportedInputShape,
}
