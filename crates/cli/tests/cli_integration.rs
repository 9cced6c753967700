//! Integration tests for the `formfill` binary.
//!
//! Each test spawns the real binary, writes a request to stdin or a
//! temp file, and checks the single JSON response and the exit code.

use assert_cmd::cargo::cargo_bin_cmd;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use formfill_engine::fixtures::{blank_document, sample_form};
use predicates::prelude::*;
use serde_json::json;

fn formfill() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("formfill");
    cmd.env_remove("FORMFILL_LOG");
    cmd
}

fn sample_base64() -> String {
    BASE64.encode(sample_form().unwrap())
}

/// Run with `stdin`, returning the parsed response and the exit code.
fn run_stdin(stdin: impl Into<Vec<u8>>) -> (serde_json::Value, i32) {
    let output = formfill().write_stdin(stdin).output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1, "expected one response line: {}", stdout);
    let response: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    (response, output.status.code().unwrap())
}

fn run_request(request: serde_json::Value) -> (serde_json::Value, i32) {
    run_stdin(request.to_string())
}

// ──────────────────────────────────────────────
// Inspect
// ──────────────────────────────────────────────

#[test]
fn inspect_lists_fields() {
    let (response, code) = run_request(json!({"action": "inspect", "document": sample_base64()}));
    assert_eq!(code, 0);
    assert_eq!(response["success"], true);
    assert_eq!(response["metadata"]["fieldCount"], 5);

    let name = &response["fields"][0];
    assert_eq!(name["name"], "Name");
    assert_eq!(name["type"], "text");
    assert_eq!(name["required"], true);
    assert_eq!(name["maxLength"], 40);
    assert_eq!(name["defaultValue"], serde_json::Value::Null);
    assert_eq!(response["fields"][2]["options"], json!(["Red", "Blue"]));
}

#[test]
fn inspect_accepts_legacy_document_key() {
    let (response, code) = run_request(json!({"action": "inspect", "pdfData": sample_base64()}));
    assert_eq!(code, 0);
    assert_eq!(response["success"], true);
}

#[test]
fn inspect_document_without_form() {
    let document = BASE64.encode(blank_document().unwrap());
    let (response, code) = run_request(json!({"action": "inspect", "document": document}));
    assert_eq!(code, 0);
    assert_eq!(response["fields"], json!([]));
    assert_eq!(response["metadata"]["fieldCount"], 0);
}

#[test]
fn inspect_rejects_non_pdf_bytes() {
    let document = BASE64.encode(b"PK\x03\x04 zip archive");
    let (response, code) = run_request(json!({"action": "inspect", "document": document}));
    assert_eq!(code, 0);
    assert_eq!(response["errorType"], "data");
    assert_eq!(
        response["error"],
        "Invalid PDF file format. File does not appear to be a valid PDF."
    );
}

// ──────────────────────────────────────────────
// Fill
// ──────────────────────────────────────────────

#[test]
fn fill_returns_filled_document() {
    let (response, code) = run_request(json!({
        "action": "fill",
        "document": sample_base64(),
        "fieldMappings": {"Name": "Ann", "Subscribe": true},
        "options": {"flatten": true}
    }));
    assert_eq!(code, 0);
    assert_eq!(response["success"], true);
    assert_eq!(response["metadata"]["fieldCount"], 2);
    assert_eq!(response["metadata"]["filledFieldCount"], 2);

    let filled = BASE64.decode(response["data"].as_str().unwrap()).unwrap();
    assert!(filled.starts_with(b"%PDF"));

    // The filled document inspects cleanly and reports its new values.
    let (inspected, _) = run_request(json!({
        "action": "inspect",
        "document": response["data"]
    }));
    assert_eq!(inspected["fields"][0]["defaultValue"], "Ann");
    assert_eq!(inspected["fields"][1]["defaultValue"], "Yes");
}

#[test]
fn fill_unknown_field_is_data_error() {
    let (response, code) = run_request(json!({
        "action": "fill",
        "document": sample_base64(),
        "fieldMappings": {"Unknown": "x"}
    }));
    assert_eq!(code, 0);
    assert_eq!(response["success"], false);
    assert_eq!(response["errorType"], "data");
    assert_eq!(
        response["error"],
        "Fields not found in PDF: Unknown. Available fields: Address.Street, Color, Country, Name, Subscribe"
    );
    assert!(response.get("details").is_none());
}

#[test]
fn fill_without_mappings_is_config_error() {
    let (response, code) = run_request(json!({"action": "fill", "document": sample_base64()}));
    assert_eq!(code, 1);
    assert_eq!(response["errorType"], "config");
    assert_eq!(response["error"], "Field mappings required for fill action");
}

#[test]
fn fill_value_over_ceiling_is_rejected() {
    let output = formfill()
        .args(["--max-value-length", "5"])
        .write_stdin(
            json!({
                "action": "fill",
                "document": sample_base64(),
                "fieldMappings": {"Name": "Annabelle"}
            })
            .to_string(),
        )
        .output()
        .unwrap();
    let response: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["errorType"], "data");
    assert_eq!(
        response["error"],
        "Value for field 'Name' is too long (>5 characters)"
    );
}

// ──────────────────────────────────────────────
// Transport
// ──────────────────────────────────────────────

#[test]
fn empty_input_is_config_error() {
    let (response, code) = run_stdin("   \n");
    assert_eq!(code, 1);
    assert_eq!(response["errorType"], "config");
    assert_eq!(response["error"], "Failed to read input: Empty input received");
}

#[test]
fn malformed_json_reports_position() {
    let (response, code) = run_stdin("{\"action\": \"inspect\",\n  oops}");
    assert_eq!(code, 1);
    assert_eq!(response["errorType"], "config");
    let error = response["error"].as_str().unwrap();
    assert!(error.starts_with("Invalid JSON input at line 2, column"), "{}", error);
}

#[test]
fn missing_action_is_config_error() {
    let (response, code) = run_request(json!({"document": sample_base64()}));
    assert_eq!(code, 1);
    assert_eq!(response["error"], "Missing required field: action");
}

#[test]
fn non_finite_number_tokens_are_invalid_json() {
    let request = format!(
        r#"{{"action": "fill", "document": "{}", "fieldMappings": {{"Age": NaN}}}}"#,
        sample_base64()
    );
    let (response, code) = run_stdin(request);
    assert_eq!(code, 1);
    assert_eq!(response["errorType"], "config");
    let error = response["error"].as_str().unwrap();
    assert!(error.starts_with("Invalid JSON input at line 1"), "{}", error);
}

#[cfg(unix)]
#[test]
fn interrupt_while_reading_stdin_reports_failure() {
    use std::io::Read;
    use std::process::{Command, Stdio};
    use std::time::Duration;

    let mut child = Command::new(assert_cmd::cargo::cargo_bin!("formfill"))
        .env_remove("FORMFILL_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    // Keep stdin open so the read never completes on its own.
    let _stdin = child.stdin.take().unwrap();

    std::thread::sleep(Duration::from_millis(500));
    let sent = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(sent.success());

    let status = child.wait().unwrap();
    let mut stdout = String::new();
    child.stdout.take().unwrap().read_to_string(&mut stdout).unwrap();

    assert_eq!(status.code(), Some(1), "stdout: {}", stdout);
    let response: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(
        response,
        json!({"success": false, "errorType": "runtime", "error": "Operation was interrupted"})
    );
}

#[test]
fn request_can_come_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("request.json");
    std::fs::write(
        &path,
        json!({"action": "inspect", "document": sample_base64()}).to_string(),
    )
    .unwrap();

    formfill()
        .arg("--input")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""success":true"#));
}

#[test]
fn missing_input_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    formfill()
        .arg("--input")
        .arg(dir.path().join("absent.json"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""errorType":"config""#))
        .stdout(predicate::str::contains("Failed to read input"));
}

#[test]
fn pretty_output_is_indented() {
    formfill()
        .arg("--pretty")
        .write_stdin(json!({"action": "merge", "document": "JVBERi0K"}).to_string())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\n  \"error\": \"Invalid action 'merge'. Must be one of: inspect, fill\""));
}

#[test]
fn zero_limit_is_rejected() {
    formfill()
        .args(["--max-document-size", "0"])
        .write_stdin("{}")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""errorType":"config""#));
}

#[test]
fn logs_stay_on_stderr() {
    let output = formfill()
        .args(["--log-level", "debug", "--log-format", "json"])
        .write_stdin(json!({"action": "inspect", "document": sample_base64()}).to_string())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("inspected document"), "{}", stderr);
}
