//! Job definitions as handed out by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Job type discriminator for the video clip pipeline.
pub const VIDEO_CLIP_JOB_TYPE: &str = "VIDEO_CLIP";

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job status as tracked by the backend.
///
/// The worker never mutates this; it is only read from the claim response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Waiting to be claimed
    Pending,
    /// Claimed by a worker
    Processing,
    /// Finished successfully
    Completed,
    /// Failed (the backend may requeue it)
    Failed,
    /// Anything this worker does not know about
    #[default]
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job claimed from the backend queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Job type, selects the handler
    #[serde(rename = "type")]
    pub job_type: String,

    /// Backend-owned status
    #[serde(default)]
    pub status: JobStatus,

    /// Handler-specific payload, opaque to the poll loop
    #[serde(default)]
    pub payload: serde_json::Value,

    /// Upload title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Upload description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Upload category id
    #[serde(rename = "categoryID", default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,

    /// Upload privacy status (public, unlisted, private)
    #[serde(rename = "privacystatus", default, skip_serializing_if = "Option::is_none")]
    pub privacy_status: Option<String>,

    /// Worker currently holding the lock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,

    /// Attempts made so far
    #[serde(default)]
    pub attempts: u32,

    /// Maximum attempts before the backend gives up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a job with the given id, type and payload.
    pub fn new(
        id: impl Into<String>,
        job_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: JobId::from_string(id),
            job_type: job_type.into(),
            status: JobStatus::Processing,
            payload,
            title: None,
            description: None,
            category_id: None,
            privacy_status: None,
            locked_by: None,
            attempts: 0,
            max_attempts: None,
            created_at: None,
        }
    }
}
