//! Per-job heartbeat supervisor.
//!
//! One background task per job pings the backend every period until the
//! [`HeartbeatGuard`] for that job is stopped or dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use clip_backend::JobBackend;
use clip_models::JobId;

use crate::metrics;
use crate::retry::FailureTracker;

/// Consecutive failures logged before the rest are suppressed.
const MAX_LOGGED_FAILURES: u32 = 3;

/// Starts heartbeat tasks against a backend.
#[derive(Clone)]
pub struct HeartbeatSupervisor {
    backend: Arc<dyn JobBackend>,
    period: Duration,
}

impl HeartbeatSupervisor {
    pub fn new(backend: Arc<dyn JobBackend>, period: Duration) -> Self {
        Self { backend, period }
    }

    /// Spawn the heartbeat task for `job_id`. The first ping goes out one
    /// period after this call.
    pub fn start(&self, job_id: JobId) -> HeartbeatGuard {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let backend = Arc::clone(&self.backend);
        let period = self.period;
        let task_job_id = job_id.clone();

        let handle = tokio::spawn(async move {
            let job_id = task_job_id;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut failures = FailureTracker::new(MAX_LOGGED_FAILURES);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {}
                }

                // A stop signal abandons an in-flight ping
                let result = tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    result = backend.report_heartbeat(&job_id) => result,
                };

                match result {
                    Ok(()) => {
                        failures.record_success();
                        metrics::record_heartbeat(true);
                        debug!(job_id = %job_id, "Heartbeat sent");
                    }
                    Err(e) => {
                        metrics::record_heartbeat(false);
                        if failures.record_failure() {
                            warn!(job_id = %job_id, "Heartbeat failed: {}", e);
                        }
                    }
                }
            }

            debug!(job_id = %job_id, "Heartbeat stopped");
        });

        HeartbeatGuard {
            job_id,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }
}

/// Owns the stop signal of one heartbeat task.
///
/// [`stop`](Self::stop) signals and waits for the task to exit. Dropping the
/// guard without calling `stop` still signals, but does not wait.
pub struct HeartbeatGuard {
    job_id: JobId,
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl HeartbeatGuard {
    /// Stop the heartbeat. No ping for this job is sent once this returns.
    pub async fn stop(mut self) {
        self.signal();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(job_id = %self.job_id, "Heartbeat task ended abnormally: {}", e);
            }
        }
    }

    fn signal(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // The task may already be gone; nothing to do then
            let _ = tx.send(());
        }
    }
}

impl Drop for HeartbeatGuard {
    fn drop(&mut self) {
        self.signal();
    }
}
