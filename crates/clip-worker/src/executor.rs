//! Job handler dispatch.
//!
//! Handlers are looked up by job type in a [`HandlerRegistry`] and run in
//! their own task through [`execute_contained`], which turns every return,
//! error or panic into exactly one [`JobOutcome`].

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI16, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::task::JoinError;
use tracing::{debug, Instrument};

use clip_backend::JobBackend;
use clip_models::{Job, JobId, JobOutcome};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

/// Domain work for one job type.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The `job.type` this handler serves.
    fn job_type(&self) -> &str;

    /// Run the job. `Ok(None)` and `Ok(Some(Value::Null))` count as failures.
    async fn execute(&self, job: &Job, ctx: &JobContext) -> WorkerResult<Option<Value>>;
}

/// Pure mapping from job type to handler.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own job type, replacing any previous one.
    pub fn register(mut self, handler: Arc<dyn JobHandler>) -> Self {
        self.handlers.insert(handler.job_type().to_string(), handler);
        self
    }

    pub fn resolve(&self, job_type: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(job_type).cloned()
    }

    pub fn job_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

/// What a handler can see of the worker while it runs.
#[derive(Clone)]
pub struct JobContext {
    pub job_id: JobId,
    pub progress: ProgressReporter,
    pub logger: JobLogger,
}

impl JobContext {
    pub fn new(job: &Job, backend: Arc<dyn JobBackend>) -> Self {
        Self {
            job_id: job.id.clone(),
            progress: ProgressReporter::new(backend, job.id.clone()),
            logger: JobLogger::new(&job.id, &job.job_type),
        }
    }
}

/// Best-effort, non-decreasing progress updates for one job.
#[derive(Clone)]
pub struct ProgressReporter {
    backend: Arc<dyn JobBackend>,
    job_id: JobId,
    /// Last forwarded value, -1 before the first
    last: Arc<AtomicI16>,
}

impl ProgressReporter {
    pub fn new(backend: Arc<dyn JobBackend>, job_id: JobId) -> Self {
        Self {
            backend,
            job_id,
            last: Arc::new(AtomicI16::new(-1)),
        }
    }

    /// Forward `percent` unless it does not exceed the last forwarded value.
    ///
    /// Values above 100 are clamped. Failures are logged, never returned.
    pub async fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let advanced = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                (i16::from(percent) > last).then_some(i16::from(percent))
            })
            .is_ok();

        if !advanced {
            debug!(job_id = %self.job_id, percent, "Dropping stale progress update");
            return;
        }

        if let Err(e) = self.backend.report_progress(&self.job_id, percent).await {
            debug!(job_id = %self.job_id, percent, "Progress report failed: {}", e);
        }
    }
}

/// Run `handler` in its own task and normalize whatever happens.
pub async fn execute_contained(
    handler: Arc<dyn JobHandler>,
    job: Job,
    ctx: JobContext,
) -> JobOutcome {
    let span = ctx.logger.create_span();
    let task = tokio::spawn(async move { handler.execute(&job, &ctx).await }.instrument(span));

    match task.await {
        Ok(result) => JobOutcome::from_result(result),
        Err(e) => JobOutcome::failed(join_failure(e).to_string()),
    }
}

fn join_failure(e: JoinError) -> WorkerError {
    if e.is_panic() {
        WorkerError::ExecutorFault(panic_message(e.into_panic()))
    } else {
        WorkerError::Cancelled
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
