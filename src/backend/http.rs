//! HTTP backend using reqwest
//!
//! Talks to the question-answering service configured by `api_url`.

use async_trait::async_trait;
use serde::Serialize;

use super::{Backend, QueryResult};
use crate::catalog::Question;
use crate::config::ViewerConfig;
use crate::error::{PipevizError, Result};

/// Backend that calls the real service
pub struct HttpBackend {
    client: reqwest::Client,
    /// Base URL without trailing slash
    base: String,
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    question: &'a str,
}

impl HttpBackend {
    /// Build from a validated config (base URL and request timeout)
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let base = config.base_url()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base: base.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}/{}", self.base, route)
    }

    async fn fetch_questions(&self) -> Result<Vec<Question>> {
        let response = self.client.get(self.endpoint("questions")).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipevizError::from_status(status.as_u16(), &body));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn questions(&self) -> Vec<Question> {
        match self.fetch_questions().await {
            Ok(questions) => {
                tracing::debug!(count = questions.len(), "Fetched question catalog");
                questions
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %self.base, "Failed to fetch questions, using empty catalog");
                Vec::new()
            }
        }
    }

    async fn run(&self, question: &str) -> Result<QueryResult> {
        tracing::debug!(url = %self.base, question, "Sending question to service");

        let response = self
            .client
            .post(self.endpoint("run"))
            .json(&RunRequest { question })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), error = %body.trim(), "Service returned an error");
            return Err(PipevizError::from_status(status.as_u16(), &body));
        }

        let body = response.text().await?;
        let result = QueryResult::from_json_str(&body)?;
        tracing::info!(
            steps = result.steps.len(),
            answer = %result.answer,
            "Query completed"
        );
        Ok(result)
    }
}
