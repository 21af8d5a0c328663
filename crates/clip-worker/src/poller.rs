//! The claim/execute/report loop.
//!
//! One job at a time: claim, run the handler under a heartbeat, stop the
//! heartbeat, send exactly one terminal report, repeat. Nothing a job does
//! can end the loop; only the shutdown signal does.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use clip_backend::{BackendError, JobBackend};
use clip_models::{Job, JobId, JobOutcome};

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::executor::{execute_contained, HandlerRegistry, JobContext};
use crate::heartbeat::HeartbeatSupervisor;
use crate::logging::JobLogger;
use crate::metrics;
use crate::retry::{retry_async_if, RetryConfig, RetryResult};

/// What one iteration of the loop did.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The claim call failed.
    TransportError,
    /// The queue was empty.
    NoJob,
    /// A job was claimed and its outcome reported (or the report failed).
    Executed {
        job_id: JobId,
        outcome: JobOutcome,
        reported: bool,
    },
}

impl PollOutcome {
    /// Sleep before the next claim.
    pub fn backoff(&self, poll_interval: Duration, empty_factor: u32) -> Duration {
        match self {
            PollOutcome::TransportError => poll_interval,
            PollOutcome::NoJob => poll_interval.saturating_mul(empty_factor),
            PollOutcome::Executed { .. } => Duration::ZERO,
        }
    }
}

/// Single-job poll loop.
pub struct PollLoop {
    backend: Arc<dyn JobBackend>,
    registry: HandlerRegistry,
    heartbeat: HeartbeatSupervisor,
    poll_interval: Duration,
    empty_factor: u32,
    report_retry: RetryConfig,
}

impl PollLoop {
    pub fn new(backend: Arc<dyn JobBackend>, registry: HandlerRegistry, config: &WorkerConfig) -> Self {
        Self {
            heartbeat: HeartbeatSupervisor::new(Arc::clone(&backend), config.heartbeat_interval),
            backend,
            registry,
            poll_interval: config.poll_interval,
            empty_factor: config.empty_backoff_factor.max(2),
            report_retry: RetryConfig::new("terminal report").with_max_retries(config.report_retries),
        }
    }

    /// Run until `shutdown` becomes `true` or its sender is dropped.
    ///
    /// Shutdown is checked between iterations and during backoff sleeps; a
    /// running job always finishes and is reported first.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            job_types = ?self.registry.job_types(),
            poll_interval_secs = self.poll_interval.as_secs(),
            "Poll loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let outcome = self.run_once().await;
            let delay = outcome.backoff(self.poll_interval, self.empty_factor);
            if delay.is_zero() {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Poll loop stopped");
    }

    /// One claim and, if a job was claimed, its execution and report.
    pub async fn run_once(&self) -> PollOutcome {
        let job = match self.backend.claim_next().await {
            Ok(Some(job)) => job,
            Ok(None) => {
                metrics::record_claim("empty");
                debug!("No job available");
                return PollOutcome::NoJob;
            }
            Err(e) => {
                metrics::record_claim("error");
                warn!(http_status = ?e.status(), "Claim failed: {}", e);
                return PollOutcome::TransportError;
            }
        };

        metrics::record_claim("job");
        let job_id = job.id.clone();
        let outcome = self.execute(job).await;
        let reported = self.report(&job_id, &outcome).await;

        PollOutcome::Executed {
            job_id,
            outcome,
            reported,
        }
    }

    async fn execute(&self, job: Job) -> JobOutcome {
        let logger = JobLogger::new(&job.id, &job.job_type);

        let Some(handler) = self.registry.resolve(&job.job_type) else {
            let err = WorkerError::UnknownJobType(job.job_type.clone());
            logger.log_error(&err.to_string());
            metrics::record_job(&job.job_type, "FAILED", Duration::ZERO);
            return JobOutcome::failed(err.to_string());
        };

        logger.log_start(&format!("attempt {}", job.attempts + 1));

        let job_type = job.job_type.clone();
        let started = Instant::now();
        let ctx = JobContext::new(&job, Arc::clone(&self.backend));

        let guard = self.heartbeat.start(job.id.clone());
        let outcome = execute_contained(handler, job, ctx).await;
        guard.stop().await;

        let elapsed = started.elapsed();
        metrics::record_job(&job_type, outcome.status_str(), elapsed);
        logger.log_outcome(&outcome, elapsed.as_secs_f64());
        outcome
    }

    /// Send the terminal report; `true` when the backend accepted it.
    async fn report(&self, job_id: &JobId, outcome: &JobOutcome) -> bool {
        let result = retry_async_if(
            &self.report_retry,
            || async move {
                match outcome {
                    JobOutcome::Completed { result } => {
                        self.backend.report_complete(job_id, result).await
                    }
                    JobOutcome::Failed { error } => self.backend.report_failed(job_id, error).await,
                }
            },
            BackendError::is_retryable,
        )
        .await;

        match result {
            RetryResult::Success(()) => {
                metrics::record_report(true);
                debug!(job_id = %job_id, status = outcome.status_str(), "Reported job outcome");
                true
            }
            RetryResult::Failed { error: e, attempts } => {
                metrics::record_report(false);
                error!(
                    job_id = %job_id,
                    status = outcome.status_str(),
                    attempts,
                    http_status = ?e.status(),
                    "Failed to report job outcome: {}", e
                );
                false
            }
        }
    }
}
