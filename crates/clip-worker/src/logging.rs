//! Structured logging.
//!
//! [`init_tracing`] sets up the subscriber for the binaries; [`JobLogger`]
//! gives every job the same lifecycle lines and fields.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clip_models::{JobId, JobOutcome};

/// Filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_DIRECTIVES: &[&str] = &["clip_worker=info", "clip_backend=info", "clip_media=info"];

/// Install the global subscriber: JSON when `LOG_FORMAT=json`, colored text otherwise.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = env_filter();

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES.join(",")))
}

/// Per-job logger carrying the job id and type on every line.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    job_type: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, job_type: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            job_type: job_type.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            job_type = %self.job_type,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            job_type = %self.job_type,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            job_type = %self.job_type,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            job_type = %self.job_type,
            "Job error: {}", message
        );
    }

    /// Log the terminal outcome at the matching level.
    pub fn log_outcome(&self, outcome: &JobOutcome, elapsed_secs: f64) {
        match outcome {
            JobOutcome::Completed { .. } => info!(
                job_id = %self.job_id,
                job_type = %self.job_type,
                elapsed_secs,
                "Job completed"
            ),
            JobOutcome::Failed { error } => warn!(
                job_id = %self.job_id,
                job_type = %self.job_type,
                elapsed_secs,
                "Job failed: {}", error
            ),
        }
    }

    /// Span covering one job's execution.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            job_type = %self.job_type
        )
    }
}
