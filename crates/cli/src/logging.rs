//! Diagnostic logging setup.
//!
//! Logs go to stderr only; stdout carries exactly one response object.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::LogFormat;

/// Environment variable that overrides `--log-level` with a full filter.
pub(crate) const LOG_ENV: &str = "FORMFILL_LOG";

fn build_filter(level: &str) -> Result<EnvFilter, String> {
    match std::env::var(LOG_ENV) {
        Ok(spec) if !spec.trim().is_empty() => EnvFilter::try_new(&spec)
            .map_err(|e| format!("invalid {} filter '{}': {}", LOG_ENV, spec, e)),
        _ => EnvFilter::try_new(level).map_err(|e| format!("invalid log level '{}': {}", level, e)),
    }
}

/// Install the global subscriber.
pub(crate) fn init(level: &str, format: LogFormat) -> Result<(), String> {
    let filter = build_filter(level)?;
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(layer.json().with_filter(filter))
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(layer.with_ansi(false).with_filter(filter))
            .try_init(),
    }
    .map_err(|e| e.to_string())
}
