//! # Backend Abstraction Layer
//!
//! The question-answering service is an external collaborator. It exposes
//! two routes:
//!
//! - `GET /questions` returns the question catalog
//! - `POST /run` with `{"question": "..."}` returns the answer together with
//!   every intermediate artifact the pipeline produced
//!
//! | Backend | Use Case |
//! |---------|----------|
//! | [`HttpBackend`] | The real service over HTTP |
//! | [`MockBackend`] | Demo mode and tests, no network |

mod http;
mod mock;

pub use http::HttpBackend;
pub use mock::MockBackend;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::Question;
use crate::error::Result;
use crate::pipeline::{PipelineView, RawStep};
use crate::value::SemanticValue;

/// Answer plus the raw step list of one `/run` call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default, deserialize_with = "answer_text")]
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub steps: Vec<RawStep>,
}

impl QueryResult {
    pub fn new(answer: impl Into<String>, steps: Vec<RawStep>) -> Self {
        Self {
            answer: answer.into(),
            steps,
        }
    }

    pub fn pipeline(&self) -> PipelineView {
        PipelineView::build(&self.steps)
    }

    /// Parse a saved `/run` response body
    pub fn from_json_str(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

/// Answers are usually strings; anything else is shown as JSON text
fn answer_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => SemanticValue::from_json(other).to_compact_json(),
    })
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<RawStep>, D::Error> {
    Ok(Option::<Vec<RawStep>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The question-answering service
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend name for logs and the header
    fn name(&self) -> &str;

    /// Question catalog. Failures degrade to an empty list.
    async fn questions(&self) -> Vec<Question>;

    /// Run the full pipeline for one question
    async fn run(&self, question: &str) -> Result<QueryResult>;
}
