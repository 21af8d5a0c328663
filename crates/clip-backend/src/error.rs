//! Backend client error types.

use thiserror::Error;

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("{endpoint} returned {status}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Report for job {job_id} rejected with {status}: {body}")]
    Report {
        job_id: String,
        status: u16,
        body: String,
    },

    #[error("jobID is empty")]
    EmptyJobId,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BackendError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether repeating the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Transport(_) => true,
            BackendError::UnexpectedStatus { status, .. } | BackendError::Report { status, .. } => {
                *status >= 500 || *status == 429
            }
            _ => false,
        }
    }

    /// HTTP status of the failed call, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::UnexpectedStatus { status, .. } | BackendError::Report { status, .. } => {
                Some(*status)
            }
            BackendError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status() {
        let report = BackendError::Report {
            job_id: "j1".into(),
            status: 403,
            body: "not job owner".into(),
        };
        assert_eq!(report.status(), Some(403));
        assert_eq!(BackendError::malformed("no job key").status(), None);
        assert_eq!(BackendError::EmptyJobId.status(), None);
    }

    #[test]
    fn test_retryable() {
        let rejected = BackendError::Report {
            job_id: "j1".into(),
            status: 403,
            body: String::new(),
        };
        let unavailable = BackendError::Report {
            job_id: "j1".into(),
            status: 503,
            body: String::new(),
        };
        assert!(!rejected.is_retryable());
        assert!(unavailable.is_retryable());
        assert!(!BackendError::EmptyJobId.is_retryable());
    }

    #[test]
    fn test_empty_job_id_message() {
        assert_eq!(BackendError::EmptyJobId.to_string(), "jobID is empty");
    }
}
