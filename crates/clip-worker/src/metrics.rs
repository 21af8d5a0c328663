//! Prometheus metrics for the worker.
//!
//! Recording is a no-op until [`install_exporter`] installs a recorder.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const CLAIMS_TOTAL: &str = "clip_worker_claims_total";
    pub const JOBS_TOTAL: &str = "clip_worker_jobs_total";
    pub const JOB_DURATION_SECONDS: &str = "clip_worker_job_duration_seconds";
    pub const HEARTBEATS_TOTAL: &str = "clip_worker_heartbeats_total";
    pub const REPORTS_TOTAL: &str = "clip_worker_reports_total";
}

/// Serve `/metrics` on `0.0.0.0:<port>`. Must run inside the tokio runtime.
pub fn install_exporter(port: u16) -> WorkerResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
        .install()
        .map_err(|e| WorkerError::config_error(format!("metrics exporter: {}", e)))
}

/// Record a claim attempt (`job`, `empty` or `error`).
pub fn record_claim(outcome: &'static str) {
    counter!(names::CLAIMS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a finished job.
pub fn record_job(job_type: &str, status: &'static str, elapsed: Duration) {
    let labels = [
        ("job_type", job_type.to_string()),
        ("status", status.to_string()),
    ];
    counter!(names::JOBS_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "job_type" => job_type.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_heartbeat(ok: bool) {
    counter!(names::HEARTBEATS_TOTAL, "result" => result_label(ok)).increment(1);
}

pub fn record_report(ok: bool) {
    counter!(names::REPORTS_TOTAL, "result" => result_label(ok)).increment(1);
}

fn result_label(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}
