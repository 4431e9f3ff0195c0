// =============================================================================
// Meridian TA — Main Entry Point
// =============================================================================
//
// Reads one positional argument (a path to a JSON file, or a base64-encoded
// JSON payload), runs the multi-timeframe analysis, and prints the report
// document on stdout.  Diagnostics go to stderr; the exit code is 0 even on
// logical failure so that calling processes only ever parse stdout.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod anomalies;
mod bars;
mod config;
mod error;
mod indicators;
mod report;
mod risk;
mod signals;
mod timeframe;

use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::report::{analyze, ErrorDocument, InputPayload};

/// A file-path argument must stay short; anything longer is base64 data.
const MAX_PATH_LEN: usize = 500;
/// Upper bound on the base64 argument itself.
const MAX_BASE64_LEN: usize = 200_000;
/// Upper bound on the decoded / read JSON text.
const MAX_JSON_LEN: usize = 2_000_000;

fn main() {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let output = match run() {
        Ok(report) => report,
        Err(e) => {
            error!(error = %format!("{e:#}"), "analysis failed");
            serde_json::to_string(&ErrorDocument::new(format!("{e:#}")))
                .unwrap_or_else(|_| r#"{"error":"technical analysis failed"}"#.to_string())
        }
    };
    println!("{output}");
}

fn run() -> Result<String> {
    let arg = std::env::args()
        .nth(1)
        .context("missing input argument (file path or base64 payload)")?;

    let json = read_input(&arg)?;
    if json.len() > MAX_JSON_LEN {
        bail!("JSON payload too large: {} characters", json.len());
    }

    let value: serde_json::Value =
        serde_json::from_str(&json).context("failed to parse input JSON")?;
    let payload: InputPayload =
        serde_json::from_value(value).map_err(|_| AnalysisError::UnsupportedInputShape)?;

    let config = AnalysisConfig::from_env();
    let report = analyze(&payload, &config)?;
    serde_json::to_string(&report).context("failed to serialise report")
}

/// Resolve the positional argument to JSON text: a `.json` file path when it
/// looks like one and exists, a base64 payload otherwise.
fn read_input(arg: &str) -> Result<String> {
    if arg.ends_with(".json") && arg.len() < MAX_PATH_LEN {
        let path = Path::new(arg);
        if path.exists() {
            info!(path = %arg, "reading bar data from file");
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read input file {arg}"));
        }
        bail!("input file not found: {arg}");
    }

    info!("reading bar data from base64 argument");
    if arg.len() > MAX_BASE64_LEN {
        bail!("base64 payload too large: {} characters", arg.len());
    }
    let decoded = BASE64
        .decode(arg.trim())
        .context("failed to decode base64 payload")?;
    String::from_utf8(decoded).context("base64 payload is not valid UTF-8")
}
