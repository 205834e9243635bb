use std::fmt;

use serde_json::Value;

/// Errors a [`crate::MatchSource`] may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Network or transport failure.
    Transport(String),
    /// The request did not complete within the configured timeout.
    Timeout(String),
    /// Credential missing, expired or rejected (401/403).
    Auth(String),
    /// The upstream answered with a non-success status.
    Api { status: u16, message: String },
    /// The response body was not the expected shape.
    Decode(String),
    /// A required configuration value is missing or invalid.
    Config(String),
}

impl SourceError {
    /// Transport hiccups, timeouts, throttling and 5xx are worth another try.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Transport(_) | SourceError::Timeout(_) => true,
            SourceError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP status to mirror back to a caller of the proxy endpoint.
    pub fn http_status(&self) -> u16 {
        match self {
            SourceError::Api { status, .. } => *status,
            SourceError::Auth(_) => 401,
            SourceError::Timeout(_) => 504,
            SourceError::Transport(_) | SourceError::Decode(_) => 502,
            SourceError::Config(_) => 500,
        }
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout(e.to_string())
        } else if e.is_decode() {
            SourceError::Decode(e.to_string())
        } else {
            SourceError::Transport(e.to_string())
        }
    }

    /// Map a non-success response to a typed error. `body` is the raw text.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let message = error_message(body);
        match status {
            401 | 403 => SourceError::Auth(message),
            _ => SourceError::Api { status, message },
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Transport(msg) => write!(f, "match source transport error: {msg}"),
            SourceError::Timeout(msg) => write!(f, "match source timeout: {msg}"),
            SourceError::Auth(msg) => write!(f, "match source auth error: {msg}"),
            SourceError::Api { status, message } => {
                write!(f, "match source api error status={status}: {message}")
            }
            SourceError::Decode(msg) => write!(f, "match source decode error: {msg}"),
            SourceError::Config(msg) => write!(f, "match source config error: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Best-effort human message from an error body: `{error}`, `{message}`,
/// `{errors:[{message}]}` or the raw text.
fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        if let Some(s) = v.get("error").and_then(Value::as_str) {
            return s.to_string();
        }
        if let Some(s) = v.get("message").and_then(Value::as_str) {
            return s.to_string();
        }
        if let Some(s) = v
            .get("errors")
            .and_then(Value::as_array)
            .and_then(|errs| errs.first())
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
        {
            return s.to_string();
        }
    }
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
