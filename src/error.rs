//! Error types for each layer of the service.
//!
//! - [`PipelineError`]: failures of a single pipeline stage. These never
//!   reach the HTTP layer; the assembler logs them and falls back.
//! - [`AskError`]: failures talking to the LLM provider, classified so the
//!   retry wrapper can decide whether another attempt is worthwhile.
//! - [`ConfigError`]: invalid or missing configuration at start-up.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// A failure in one stage of the article pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The index page could not be downloaded or returned an error status.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The article page could not be downloaded or parsed into text.
    #[error("failed to extract article from {url}: {reason}")]
    Extraction { url: String, reason: String },

    /// The LLM provider call failed.
    #[error("summarization request failed: {0}")]
    Summarization(#[from] AskError),

    /// The LLM answered, but not with the expected JSON object.
    #[error("malformed summary response: {0}")]
    MalformedResponse(String),
}

/// A failed chat-completion call.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status {
        status: StatusCode,
        body: String,
        retry_after: Option<Duration>,
    },

    #[error("completion contained no message content")]
    EmptyCompletion,
}

impl AskError {
    /// Whether the call may succeed if repeated.
    ///
    /// Rate limiting (429), server errors and transient transport problems
    /// are retryable; anything else (bad key, bad request, empty answer) is
    /// not.
    pub fn is_retryable(&self) -> bool {
        match self {
            AskError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AskError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            AskError::EmptyCompletion => false,
        }
    }

    /// The delay the provider asked for, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AskError::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Invalid start-up configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> AskError {
        AskError::Status {
            status: StatusCode::from_u16(code).unwrap(),
            body: String::new(),
            retry_after: None,
        }
    }

    #[test]
    fn test_rate_limit_and_server_errors_are_retryable() {
        assert!(status(429).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!AskError::EmptyCompletion.is_retryable());
    }

    #[test]
    fn test_retry_after_only_on_status() {
        let err = AskError::Status {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
        assert_eq!(AskError::EmptyCompletion.retry_after(), None);
    }

    #[test]
    fn test_summarization_error_wraps_ask_error() {
        let err: PipelineError = status(401).into();
        assert!(err.to_string().contains("401"));
    }
}
