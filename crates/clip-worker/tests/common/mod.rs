//! Recording `JobBackend` fake shared by the worker tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use clip_backend::{BackendError, BackendResult, JobBackend};
use clip_models::{Job, JobId};

/// One call observed by the fake, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Claim,
    Heartbeat(String),
    Progress(String, u8),
    Complete(String, Value),
    Failed(String, String),
}

/// Scripted answer to one claim call.
pub enum Claim {
    Job(Job),
    Empty,
    TransportError,
}

#[derive(Default)]
pub struct RecordingBackend {
    claims: Mutex<VecDeque<Claim>>,
    events: Mutex<Vec<Event>>,
    claim_times: Mutex<Vec<Instant>>,
    /// Status codes returned by the next terminal reports, in order
    report_failures: Mutex<VecDeque<u16>>,
}

impl RecordingBackend {
    pub fn with_claims(claims: impl IntoIterator<Item = Claim>) -> Self {
        Self {
            claims: Mutex::new(claims.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn fail_reports(self, statuses: impl IntoIterator<Item = u16>) -> Self {
        *self.report_failures.lock().unwrap() = statuses.into_iter().collect();
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn heartbeats(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Heartbeat(_)))
            .count()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                Event::Progress(_, p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn claim_times(&self) -> Vec<Instant> {
        self.claim_times.lock().unwrap().clone()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn terminal(&self, job_id: &JobId) -> BackendResult<()> {
        match self.report_failures.lock().unwrap().pop_front() {
            Some(status) => Err(BackendError::Report {
                job_id: job_id.to_string(),
                status,
                body: "rejected".into(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl JobBackend for RecordingBackend {
    async fn claim_next(&self) -> BackendResult<Option<Job>> {
        self.record(Event::Claim);
        self.claim_times.lock().unwrap().push(Instant::now());

        let next = self.claims.lock().unwrap().pop_front();
        match next {
            Some(Claim::Job(job)) => Ok(Some(job)),
            Some(Claim::Empty) | None => Ok(None),
            Some(Claim::TransportError) => Err(BackendError::malformed("connection reset")),
        }
    }

    async fn report_heartbeat(&self, job_id: &JobId) -> BackendResult<()> {
        self.record(Event::Heartbeat(job_id.to_string()));
        Ok(())
    }

    async fn report_progress(&self, job_id: &JobId, percent: u8) -> BackendResult<()> {
        self.record(Event::Progress(job_id.to_string(), percent));
        Ok(())
    }

    async fn report_complete(&self, job_id: &JobId, result: &Value) -> BackendResult<()> {
        self.record(Event::Complete(job_id.to_string(), result.clone()));
        self.terminal(job_id)
    }

    async fn report_failed(&self, job_id: &JobId, cause: &str) -> BackendResult<()> {
        self.record(Event::Failed(job_id.to_string(), cause.to_string()));
        self.terminal(job_id)
    }
}
