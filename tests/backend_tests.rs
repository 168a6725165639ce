//! HTTP backend tests using wiremock
//!
//! Every test starts its own `MockServer`, points a `ViewerConfig` at it
//! and drives `HttpBackend` through the `Backend` trait.

use pipeviz::backend::{Backend, HttpBackend, MockBackend};
use pipeviz::catalog::{Catalog, QuestionId};
use pipeviz::config::ViewerConfig;
use pipeviz::error::{FixSuggestion, PipevizError};
use pipeviz::pipeline::Stage;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// HELPERS
// =============================================================================

fn backend_for(server: &MockServer) -> HttpBackend {
    let config = ViewerConfig {
        api_url: server.uri(),
        ..Default::default()
    }
    .validate()
    .unwrap();
    HttpBackend::new(&config).unwrap()
}

fn run_response() -> serde_json::Value {
    json!({
        "answer": "Arthur",
        "steps": [
            {"step": "tokens", "data": ["Ai", "bảo vệ", "Camelot", "?"]},
            {"step": "parse", "data": {"T": ["S", ["NP", "Ai"], ["VP", "bảo vệ", "Camelot"]]}},
            {"step": "dịch", "data": {"T": {"functor": "drs", "args": [["x1"], []]}}},
            {"step": "logic", "data": {"functor": "fallback", "args": []}},
            {"step": "wh_query", "data": {"functor": "lambda", "args": ["X", "X"]}},
            {"step": "wh_result", "data": ["arthur"]}
        ]
    })
}

// =============================================================================
// GET /questions
// =============================================================================

#[tokio::test]
async fn test_questions_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "text": "Smaug là rồng phải không?"},
            {"id": "w2", "text": "Ai bảo vệ Camelot?"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let questions = backend_for(&server).questions().await;
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].id, QuestionId::Number(1));
    assert_eq!(questions[1].id, QuestionId::Text("w2".to_string()));
    assert_eq!(questions[1].text, "Ai bảo vệ Camelot?");
}

#[tokio::test]
async fn test_questions_failure_degrades_to_builtin_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let questions = backend_for(&server).questions().await;
    assert!(questions.is_empty());

    let catalog = Catalog::from_remote(questions);
    assert_eq!(catalog.entries().len(), Catalog::builtin().len());
    assert!(catalog.position("Ai bảo vệ Camelot?").is_some());
}

#[tokio::test]
async fn test_questions_malformed_body_degrades() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    assert!(backend_for(&server).questions().await.is_empty());
}

// =============================================================================
// POST /run
// =============================================================================

#[tokio::test]
async fn test_run_sends_question_and_maps_stages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .and(body_json(json!({"question": "Ai bảo vệ Camelot?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_response()))
        .expect(1)
        .mount(&server)
        .await;

    let result = backend_for(&server).run("Ai bảo vệ Camelot?").await.unwrap();
    assert_eq!(result.answer, "Arthur");
    assert_eq!(result.steps.len(), 6);

    let view = result.pipeline();
    assert_eq!(view.filled_stages(), 4);
    // wh_query outranks logic even though logic comes first
    let query = view.slot(Stage::LogicQuery).unwrap();
    assert_eq!(query.as_functor().map(|f| f.name()), Some("lambda"));
    assert_eq!(view.result_raw.as_ref().map(|r| r.to_compact_json()), Some(r#"["arthur"]"#.to_string()));
}

#[tokio::test]
async fn test_run_error_body_becomes_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(500).set_body_string("parser crashed\n"))
        .mount(&server)
        .await;

    let err = backend_for(&server).run("Ai?").await.unwrap_err();
    assert_eq!(err.to_string(), "parser crashed");
    assert!(matches!(err, PipevizError::Status { status: 500, .. }));
    assert!(err.fix_suggestion().is_some());
}

#[tokio::test]
async fn test_run_empty_error_body_uses_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = backend_for(&server).run("Ai?").await.unwrap_err();
    assert_eq!(err.banner_message(), "HTTP 500");
}

#[tokio::test]
async fn test_run_null_steps_is_empty_pipeline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "No", "steps": null})))
        .mount(&server)
        .await;

    let result = backend_for(&server).run("Smaug là kiếm phải không?").await.unwrap();
    assert_eq!(result.answer, "No");
    assert!(!result.pipeline().has_data());
}

#[tokio::test]
async fn test_run_invalid_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = backend_for(&server).run("Ai?").await.unwrap_err();
    assert!(matches!(err, PipevizError::Decode(_)));
}

#[tokio::test]
async fn test_run_timeout_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(run_response())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = ViewerConfig {
        api_url: server.uri(),
        request_timeout_secs: 1,
        ..Default::default()
    };
    let err = HttpBackend::new(&config).unwrap().run("Ai?").await.unwrap_err();
    assert!(matches!(err, PipevizError::Http(_)));
}

#[tokio::test]
async fn test_trailing_slash_in_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_response()))
        .expect(1)
        .mount(&server)
        .await;

    let config = ViewerConfig {
        api_url: format!("{}/", server.uri()),
        ..Default::default()
    };
    let backend = HttpBackend::new(&config).unwrap();
    assert!(!backend.base_url().ends_with('/'));
    assert!(backend.run("Ai?").await.is_ok());
}

// =============================================================================
// MOCK BACKEND
// =============================================================================

#[tokio::test]
async fn test_mock_backend_matches_http_contract() {
    let backend = MockBackend::new();
    let result = backend.run("Ai bảo vệ Camelot?").await.unwrap();
    assert_eq!(result.answer, "Arthur");
    assert_eq!(result.pipeline().filled_stages(), 4);

    let failing = MockBackend::new().with_failure(500, "");
    let err = failing.run("Ai?").await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500");
    assert_eq!(failing.requests(), vec!["Ai?".to_string()]);
}
