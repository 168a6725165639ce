//! Error types with fix suggestions

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Errors surfaced by pipeviz.
///
/// Only transport-level failures (talking to the question-answering service)
/// and configuration problems are errors. Missing stages, oddly shaped
/// payloads and over-deep trees are handled in place and never show up here.
#[derive(Error, Debug)]
pub enum PipevizError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status. `message` is the response body, or `HTTP <code>`
    /// when the body was empty.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid API URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipevizError {
    /// Build a status error from a failed response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            body.to_string()
        };
        Self::Status { status, message }
    }

    /// Single-line description suitable for the error banner
    pub fn banner_message(&self) -> String {
        self.to_string().lines().next().unwrap_or_default().to_string()
    }
}

impl FixSuggestion for PipevizError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            PipevizError::Http(_) => Some("Check the service is reachable (--api-url or PIPEVIZ_API_URL)"),
            PipevizError::Status { status, .. } if *status >= 500 => {
                Some("The service failed on this question; try again or pick another one")
            }
            PipevizError::Status { .. } => Some("Check the question text and the service URL"),
            PipevizError::Decode(_) => Some("The service answered with unexpected JSON; check the API version"),
            PipevizError::InvalidUrl { .. } => Some("Use an absolute URL such as https://host:port"),
            PipevizError::ConfigParse(_) => Some("Check YAML syntax in the config file"),
            PipevizError::Config(_) => None,
            PipevizError::Io(_) => Some("Check file path and permissions"),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipevizError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_uses_body_text() {
        let err = PipevizError::from_status(422, "question must not be empty\n");
        assert_eq!(err.to_string(), "question must not be empty");
    }

    #[test]
    fn test_status_empty_body_falls_back_to_code() {
        let err = PipevizError::from_status(503, "   ");
        assert_eq!(err.to_string(), "HTTP 503");
        assert!(err.fix_suggestion().is_some());
    }

    #[test]
    fn test_banner_message_is_single_line() {
        let err = PipevizError::from_status(500, "Traceback\n  File x\nKeyError");
        assert_eq!(err.banner_message(), "Traceback");
    }
}
