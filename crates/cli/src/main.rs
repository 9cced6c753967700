mod logging;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use formfill_core::classify::FailureDetails;
use formfill_core::config::{MAX_DOCUMENT_LEN, MAX_VALUE_CHARS};
use formfill_core::{classify, ErrorKind, Failure, Limits, ProcessError, Processor, Response};
use formfill_engine::AcroFormEngine;

/// Log output format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Inspect or fill the form fields of a PDF document.
///
/// Reads one JSON request from stdin (or --input) and writes one JSON
/// response to stdout.
#[derive(Parser)]
#[command(name = "formfill", version, about = "PDF form field inspect/fill processor")]
struct Cli {
    /// Read the request from this file instead of stdin
    #[arg(long)]
    input: Option<PathBuf>,

    /// Pretty-print the response
    #[arg(long)]
    pretty: bool,

    /// Log level for stderr diagnostics (overridden by FORMFILL_LOG)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_enum)]
    log_format: LogFormat,

    /// Maximum length of the base64 document text, in characters
    #[arg(long, default_value_t = MAX_DOCUMENT_LEN)]
    max_document_size: usize,

    /// Maximum length of a single field value, in characters
    #[arg(long, default_value_t = MAX_VALUE_CHARS)]
    max_value_length: usize,
}

/// Printed when the response itself cannot be serialized.
const SERIALIZATION_FALLBACK: &str =
    r#"{"error":"Failed to serialize response","errorType":"runtime","success":false}"#;

/// How the request ended.
enum Outcome {
    Completed(Response),
    Unreadable(ProcessError),
    Interrupted,
    Crashed(String),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_level, cli.log_format) {
        eprintln!("warning: logging disabled: {}", e);
    }

    let limits = Limits {
        max_document_len: cli.max_document_size,
        max_value_chars: cli.max_value_length,
        ..Limits::default()
    };
    if let Err(e) = limits.validate() {
        finish(&classify(&e, None).to_json(), cli.pretty, 1);
    }

    match run(cli.input, limits) {
        Outcome::Completed(response) => {
            let code = exit_code(&response);
            finish(&response.to_json(), cli.pretty, code)
        }
        Outcome::Unreadable(e) => finish(&classify(&e, None).to_json(), cli.pretty, 1),
        Outcome::Interrupted => {
            tracing::warn!("interrupted before the request completed");
            let failure = Failure::new(ErrorKind::Runtime, "Operation was interrupted");
            finish(&failure.to_json(), cli.pretty, 1)
        }
        Outcome::Crashed(reason) => {
            tracing::error!(%reason, "request worker failed");
            let failure = Failure {
                details: Some(FailureDetails {
                    exception_type: "Panic".to_string(),
                    traceback: Some(reason),
                }),
                ..Failure::new(ErrorKind::Runtime, "Unexpected system error")
            };
            finish(&failure.to_json(), cli.pretty, 1)
        }
    }
}

/// Read and parse the request, from `input` or stdin.
fn read_request(input: Option<&Path>) -> Result<serde_json::Value, ProcessError> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).map(|_| buf)
        }
    }
    .map_err(|e| ProcessError::config(format!("Failed to read input: {}", e)))?;

    if text.trim().is_empty() {
        return Err(ProcessError::config("Failed to read input: Empty input received"));
    }

    serde_json::from_str(&text).map_err(|e| {
        let full = e.to_string();
        let reason = full.split(" at line ").next().unwrap_or(&full);
        ProcessError::config(format!(
            "Invalid JSON input at line {}, column {}: {}",
            e.line(),
            e.column(),
            reason
        ))
    })
}

/// Read and process the request on blocking workers while watching for Ctrl-C.
fn run(input: Option<PathBuf>, limits: Limits) -> Outcome {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => return Outcome::Crashed(format!("failed to start runtime: {}", e)),
    };

    let outcome = runtime.block_on(async move {
        let interrupted = tokio::signal::ctrl_c();
        tokio::pin!(interrupted);

        let reader = tokio::task::spawn_blocking(move || read_request(input.as_deref()));
        let request = tokio::select! {
            joined = reader => match joined {
                Ok(Ok(request)) => request,
                Ok(Err(e)) => return Outcome::Unreadable(e),
                Err(e) => return Outcome::Crashed(e.to_string()),
            },
            _ = &mut interrupted => return Outcome::Interrupted,
        };

        let worker = tokio::task::spawn_blocking(move || {
            Processor::with_limits(AcroFormEngine::new(), limits).handle(&request)
        });
        tokio::select! {
            joined = worker => match joined {
                Ok(response) => Outcome::Completed(response),
                Err(e) => Outcome::Crashed(e.to_string()),
            },
            _ = &mut interrupted => Outcome::Interrupted,
        }
    });

    // An interrupted worker may still be running or blocked on stdin; do not wait for it.
    runtime.shutdown_background();
    outcome
}

/// Config failures exit 1; every other dispatched response exits 0.
fn exit_code(response: &Response) -> i32 {
    match response.error_kind() {
        Some(ErrorKind::Config) => 1,
        _ => 0,
    }
}

/// Write the response to stdout and exit.
fn finish(response: &serde_json::Value, pretty: bool, code: i32) -> ! {
    let rendered = if pretty {
        serde_json::to_string_pretty(response)
    } else {
        serde_json::to_string(response)
    };

    let (text, code) = match rendered {
        Ok(text) => (text, code),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response");
            (SERIALIZATION_FALLBACK.to_string(), 1)
        }
    };

    let mut stdout = io::stdout().lock();
    if writeln!(stdout, "{}", text).and_then(|_| stdout.flush()).is_err() {
        process::exit(1);
    }
    process::exit(code);
}
