use std::fmt;

/// Errors a [`crate::DocumentStore`] may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Network or transport failure.
    Transport(String),
    /// The request did not complete within the configured timeout.
    Timeout(String),
    /// Token missing, expired or lacking permission (401/403).
    Auth(String),
    /// The stored version no longer matches the one supplied with a write,
    /// or a write without a version hit an existing path.
    Conflict { path: String },
    /// A resource that must exist (repository, directory) does not.
    NotFound { path: String },
    /// Any other non-success status.
    Api { status: u16, message: String },
    /// Payload could not be decoded (base64, UTF-8, JSON, unexpected shape).
    Decode(String),
}

impl StoreError {
    /// Transport hiccups, timeouts, throttling and 5xx are worth another try.
    /// Conflicts never are.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Transport(_) | StoreError::Timeout(_) => true,
            StoreError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoreError::Timeout(e.to_string())
        } else {
            StoreError::Transport(e.to_string())
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Transport(msg) => write!(f, "document store transport error: {msg}"),
            StoreError::Timeout(msg) => write!(f, "document store timeout: {msg}"),
            StoreError::Auth(msg) => write!(f, "document store auth error: {msg}"),
            StoreError::Conflict { path } => write!(
                f,
                "document store conflict on '{path}': stored version changed since it was read"
            ),
            StoreError::NotFound { path } => write!(f, "document store: '{path}' not found"),
            StoreError::Api { status, message } => {
                write!(f, "document store api error status={status}: {message}")
            }
            StoreError::Decode(msg) => write!(f, "document store decode error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}
