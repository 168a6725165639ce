//! Mock backend for demo mode and tests
//!
//! Answers the built-in questions with a small hand-made pipeline (tokens,
//! parse tree, DRS, logic query and result) so the dashboard can be used
//! without the service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Backend, QueryResult};
use crate::catalog::{builtin_groups, Question, QuestionId};
use crate::error::{PipevizError, Result};
use crate::pipeline::RawStep;
use crate::value::SemanticValue;

/// Known answers of the demo world
const ANSWERS: &[(&str, &str)] = &[
    ("Smaug là rồng phải không?", "Yes"),
    ("Arthur là hiệp sĩ phải không?", "Yes"),
    ("Kẻ thù tấn công Camelot phải không?", "Yes"),
    ("Tiên Nữ là bạn Arthur phải không?", "Yes"),
    ("Smaug là kẻ thù phải không?", "Yes"),
    ("Excalibur là kiếm phải không?", "Yes"),
    ("Ai bảo vệ Camelot?", "Arthur"),
    ("Ai tấn công Camelot?", "Smaug"),
    ("Ai trao Excalibur cho Arthur?", "Tiên Nữ"),
    ("Ai là bạn của Arthur?", "Tiên Nữ"),
    ("Ai sở hữu Excalibur?", "Arthur"),
    ("Tiên Nữ trao cái gì cho Arthur?", "Excalibur"),
];

const YES_NO_SUFFIX: &str = "phải không?";

/// Words that carry no predicate in the demo semantics
const FUNCTION_WORDS: &[&str] = &["ai", "là", "phải", "không", "cái", "gì", "cho", "của", "?"];

/// Backend that never touches the network
pub struct MockBackend {
    questions: Vec<Question>,
    latency: Duration,
    failure: Option<(u16, String)>,
    /// Questions received, in order
    requests: Arc<Mutex<Vec<String>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Demo backend with the built-in questions
    pub fn new() -> Self {
        let questions = builtin_groups()
            .into_iter()
            .flat_map(|g| g.questions)
            .enumerate()
            .map(|(i, text)| Question::new(QuestionId::Number(i as i64 + 1), text))
            .collect();
        Self {
            questions,
            latency: Duration::ZERO,
            failure: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the catalog (an empty one simulates a degraded service)
    pub fn with_questions(mut self, questions: Vec<Question>) -> Self {
        self.questions = questions;
        self
    }

    /// Delay every `run` call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every `run` call fail with this status and body
    pub fn with_failure(mut self, status: u16, body: impl Into<String>) -> Self {
        self.failure = Some((status, body.into()));
        self
    }

    /// Questions received so far
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Canned pipeline for `question`
    pub fn demo_result(question: &str) -> QueryResult {
        let yes_no = question.ends_with(YES_NO_SUFFIX);
        let answer = ANSWERS
            .iter()
            .find(|(q, _)| *q == question)
            .map(|(_, a)| *a)
            .unwrap_or(if yes_no { "No" } else { "" });

        let tokens = tokenize(question);
        let predicates = predicates(&tokens);
        let conditions: Vec<Value> = predicates
            .iter()
            .enumerate()
            .map(|(i, p)| json!({"functor": p, "args": [format!("x{}", i + 1)]}))
            .collect();
        let referents: Vec<Value> = (1..=conditions.len()).map(|i| json!(format!("x{}", i))).collect();

        let parse = json!({"T": {"functor": "S", "args": parse_tree(&tokens)}});
        let drs = json!({"T": {"functor": "drs", "args": [referents, conditions]}});
        let body = conjunction(&conditions);

        let (query_step, query, result_step, result) = if yes_no {
            (
                "yn_query",
                json!({"functor": "x", "args": ["x1", body]}),
                "yn_result",
                json!(answer == "Yes"),
            )
        } else {
            (
                "wh_query",
                json!({"functor": "lambda", "args": ["X", {"functor": "x", "args": ["x1", body]}]}),
                "wh_result",
                if answer.is_empty() { json!([]) } else { json!([answer]) },
            )
        };

        let step = |name: &str, data: Value| RawStep::new(name, SemanticValue::from_json(data));
        QueryResult::new(
            answer,
            vec![
                step("tokens", json!(tokens)),
                step("parse", parse),
                step("dịch", drs),
                step(query_step, query),
                step(result_step, result),
            ],
        )
    }
}

fn tokenize(question: &str) -> Vec<String> {
    let mut tokens: Vec<String> = question
        .trim_end_matches('?')
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if question.ends_with('?') {
        tokens.push("?".to_string());
    }
    tokens
}

fn predicates(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| t.to_lowercase())
        .filter(|t| !FUNCTION_WORDS.contains(&t.as_str()))
        .collect()
}

/// Subject + predicate split over the tokens
fn parse_tree(tokens: &[String]) -> Value {
    match tokens.split_first() {
        Some((head, rest)) => json!([
            {"functor": "NP", "args": [head]},
            {"functor": "VP", "args": rest},
        ]),
        None => json!([]),
    }
}

/// Right-nested pairwise conjunction
fn conjunction(conditions: &[Value]) -> Value {
    match conditions {
        [] => json!("true"),
        [only] => only.clone(),
        [first, rest @ ..] => json!({"functor": ",", "args": [first, conjunction(rest)]}),
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn questions(&self) -> Vec<Question> {
        self.questions.clone()
    }

    async fn run(&self, question: &str) -> Result<QueryResult> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(question.to_string());
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some((status, body)) = &self.failure {
            return Err(PipevizError::from_status(*status, body));
        }
        tracing::debug!(backend = "mock", question, "Answering from demo data");
        Ok(Self::demo_result(question))
    }
}
