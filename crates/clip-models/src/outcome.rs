//! Terminal job outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure description used when a handler returns neither a result nor an error.
pub const EMPTY_RESULT_MESSAGE: &str = "job returned empty result without error";

/// The single terminal outcome of a claimed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobOutcome {
    /// Work finished; carries the result payload reported to the backend.
    Completed { result: serde_json::Value },
    /// Work failed; carries the cause reported to the backend.
    Failed { error: String },
}

impl JobOutcome {
    pub fn completed(result: serde_json::Value) -> Self {
        Self::Completed { result }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    /// Normalize a handler return value.
    ///
    /// `Ok(None)` and `Ok(Some(null))` are failures, never silent successes.
    pub fn from_result<E: fmt::Display>(result: Result<Option<serde_json::Value>, E>) -> Self {
        match result {
            Ok(Some(value)) if !value.is_null() => Self::completed(value),
            Ok(_) => Self::failed(EMPTY_RESULT_MESSAGE),
            Err(e) => Self::failed(e.to_string()),
        }
    }

    pub fn status_str(&self) -> &'static str {
        match self {
            JobOutcome::Completed { .. } => "COMPLETED",
            JobOutcome::Failed { .. } => "FAILED",
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::Completed { .. } => f.write_str("completed"),
            JobOutcome::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}
