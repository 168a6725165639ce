//! Integration tests for the pipeviz CLI
//!
//! These tests run the actual binary and verify output. Each one runs in
//! its own temp dir so a stray `pipeviz.yaml` cannot leak in.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get the binary to test, isolated from the caller's environment
fn pipeviz_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pipeviz").unwrap();
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("PIPEVIZ_API_URL")
        .env_remove("PIPEVIZ_INTERVAL_MS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    pipeviz_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("step-by-step viewer"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("--api-url"));
}

#[test]
fn test_run_help_lists_view_modes() {
    let dir = TempDir::new().unwrap();
    pipeviz_cmd(&dir)
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("expr"))
        .stdout(predicate::str::contains("tree"))
        .stdout(predicate::str::contains("raw"));
}

// ============================================================================
// Demo backend
// ============================================================================

#[test]
fn test_questions_demo_lists_catalog() {
    let dir = TempDir::new().unwrap();
    pipeviz_cmd(&dir)
        .args(["questions", "--demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("12 questions"))
        .stdout(predicate::str::contains("Ai bảo vệ Camelot?"));
}

#[test]
fn test_run_demo_wh_question() {
    let dir = TempDir::new().unwrap();
    pipeviz_cmd(&dir)
        .args(["run", "Ai bảo vệ Camelot?", "--demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Tokenize"))
        .stdout(predicate::str::contains("4. Logic Query"))
        .stdout(predicate::str::contains("┌ DRS"))
        .stdout(predicate::str::contains("λX."))
        .stdout(predicate::str::contains("Full Answer: Arthur"))
        .stdout(predicate::str::contains("1. tokens"));
}

#[test]
fn test_run_demo_yes_no_question() {
    let dir = TempDir::new().unwrap();
    pipeviz_cmd(&dir)
        .args(["run", "Smaug là rồng phải không?", "--demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Yes/No Answer: Yes"))
        .stdout(predicate::str::contains("Result: true"));
}

#[test]
fn test_run_with_raw_view() {
    let dir = TempDir::new().unwrap();
    pipeviz_cmd(&dir)
        .args(["run", "Ai bảo vệ Camelot?", "--demo", "--view", "raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[Raw]"))
        .stdout(predicate::str::contains("\"functor\": \"drs\""))
        .stdout(predicate::str::contains("┌ DRS").not());
}

#[test]
fn test_run_empty_question_fails() {
    let dir = TempDir::new().unwrap();
    pipeviz_cmd(&dir)
        .args(["run", "   ", "--demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("question must not be empty"));
}

// ============================================================================
// Offline inspection
// ============================================================================

#[test]
fn test_inspect_bare_step_list() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("steps.json");
    fs::write(
        &file,
        json!([
            {"step": "tokens", "data": ["Excalibur", "là", "kiếm"]},
            {"step": "yn_query", "data": {"functor": "sword", "args": ["excalibur"]}}
        ])
        .to_string(),
    )
    .unwrap();

    pipeviz_cmd(&dir)
        .args(["inspect", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Excalibur\""))
        .stdout(predicate::str::contains("sword(excalibur)"))
        .stdout(predicate::str::contains("No data yet"))
        .stdout(predicate::str::contains("Answer: (none)"));
}

#[test]
fn test_inspect_saved_response() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("response.json");
    fs::write(
        &file,
        json!({
            "answer": "No",
            "steps": [
                {"step": "dịch_FOL", "data": {"functor": "dragon", "args": ["arthur"]}},
                {"step": "yn_result", "data": false}
            ]
        })
        .to_string(),
    )
    .unwrap();

    pipeviz_cmd(&dir)
        .args(["inspect", file.to_str().unwrap(), "--view", "tree"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[Tree]"))
        .stdout(predicate::str::contains("▼ dragon"))
        .stdout(predicate::str::contains("Yes/No Answer: No"));
}

#[test]
fn test_inspect_missing_file_fails_with_fix() {
    let dir = TempDir::new().unwrap();
    pipeviz_cmd(&dir)
        .args(["inspect", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("Fix:"));
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn test_invalid_api_url_fails_with_fix() {
    let dir = TempDir::new().unwrap();
    pipeviz_cmd(&dir)
        .args(["--api-url", "::nope", "questions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid API URL"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_unknown_config_key_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("pipeviz.yaml"), "api_url: http://localhost:1\nspeed: 3\n").unwrap();

    pipeviz_cmd(&dir)
        .args(["questions", "--demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config parse error"));
}

#[test]
fn test_env_url_is_validated() {
    let dir = TempDir::new().unwrap();
    pipeviz_cmd(&dir)
        .env("PIPEVIZ_API_URL", "ftp://example.com")
        .args(["questions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("http or https"));
}

// ============================================================================
// Real HTTP backend
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_run_against_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .and(body_json(json!({"question": "Ai sở hữu Excalibur?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Arthur",
            "steps": [{"step": "tokens", "data": ["Ai", "sở hữu", "Excalibur", "?"]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let uri = server.uri();
    pipeviz_cmd(&dir)
        .args(["--api-url", uri.as_str(), "run", "Ai sở hữu Excalibur?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sở hữu\""))
        .stdout(predicate::str::contains("Full Answer: Arthur"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_service_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(500).set_body_string("prover timeout"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let uri = server.uri();
    pipeviz_cmd(&dir)
        .args(["--api-url", uri.as_str(), "run", "Ai?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("prover timeout"))
        .stderr(predicate::str::contains("Fix:"));
}
