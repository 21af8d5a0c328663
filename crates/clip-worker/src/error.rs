//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("unknown job type: {0}")]
    UnknownJobType(String),

    #[error("invalid {job_type} payload: {message}")]
    InvalidPayload { job_type: String, message: String },

    #[error("{0} access token is required")]
    MissingToken(&'static str),

    #[error("panic: {0}")]
    ExecutorFault(String),

    #[error("job task was cancelled before it finished")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    /// Stage failures keep the collaborator's message as-is.
    #[error(transparent)]
    Media(#[from] clip_media::MediaError),

    #[error("Backend error: {0}")]
    Backend(#[from] clip_backend::BackendError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_payload(job_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            job_type: job_type.into(),
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
