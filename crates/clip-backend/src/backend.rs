//! The job API seen by the worker.

use async_trait::async_trait;

use clip_models::{Job, JobId};

use crate::error::BackendResult;

/// Operations the worker performs against the backend job queue.
///
/// Every call taking a job id must reject an empty id with
/// [`BackendError::EmptyJobId`](crate::BackendError::EmptyJobId) before
/// touching the network.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Claim the next pending job; `None` when the queue is empty.
    async fn claim_next(&self) -> BackendResult<Option<Job>>;

    /// Best-effort liveness ping.
    async fn report_heartbeat(&self, job_id: &JobId) -> BackendResult<()>;

    /// Best-effort progress update, `percent` in `0..=100`.
    async fn report_progress(&self, job_id: &JobId, percent: u8) -> BackendResult<()>;

    /// Terminal success report.
    async fn report_complete(&self, job_id: &JobId, result: &serde_json::Value)
        -> BackendResult<()>;

    /// Terminal failure report.
    async fn report_failed(&self, job_id: &JobId, cause: &str) -> BackendResult<()>;
}
