use std::fmt;

use vlb_source::SourceError;
use vlb_store::StoreError;

/// A MatchRecord create that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedWrite {
    pub match_id: String,
    pub error: StoreError,
}

/// Why a supervised run aborted. Writes made before the failure stand and
/// a re-run picks up from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    Source(SourceError),
    Store(StoreError),
    /// The roster document exists but has an empty body.
    EmptyRoster { path: String },
    MalformedRoster { path: String, message: String },
    /// At least one MatchRecord could not be written; the watermark was not
    /// advanced.
    MatchWrites { failed: Vec<FailedWrite> },
}

impl RunError {
    pub fn is_transient(&self) -> bool {
        match self {
            RunError::Source(e) => e.is_transient(),
            RunError::Store(e) => e.is_transient(),
            RunError::EmptyRoster { .. } | RunError::MalformedRoster { .. } => false,
            RunError::MatchWrites { failed } => failed.iter().all(|f| f.error.is_transient()),
        }
    }

    /// A concurrent writer changed a document this run read.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RunError::Store(e) if e.is_conflict())
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Source(e) => write!(f, "match source: {e}"),
            RunError::Store(e) => write!(f, "{e}"),
            RunError::EmptyRoster { path } => {
                write!(f, "roster document '{path}' is empty; cannot reconcile without a roster")
            }
            RunError::MalformedRoster { path, message } => {
                write!(f, "roster document '{path}' is malformed: {message}")
            }
            RunError::MatchWrites { failed } => {
                write!(f, "{} match write(s) failed, watermark not advanced", failed.len())?;
                if let Some(first) = failed.first() {
                    write!(f, " (first: {}: {})", first.match_id, first.error)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Source(e) => Some(e),
            RunError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SourceError> for RunError {
    fn from(e: SourceError) -> Self {
        RunError::Source(e)
    }
}

impl From<StoreError> for RunError {
    fn from(e: StoreError) -> Self {
        RunError::Store(e)
    }
}
