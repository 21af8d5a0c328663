//! Single-job video clip worker.
//!
//! This crate provides:
//! - The claim/execute/report poll loop with graceful shutdown
//! - A per-job heartbeat supervisor with a scoped stop guard
//! - Handler dispatch with panic containment
//! - The `VIDEO_CLIP` handler (download, cut, upload)
//! - Environment configuration, structured logging and metrics

pub mod config;
pub mod error;
pub mod executor;
pub mod heartbeat;
pub mod logging;
pub mod metrics;
pub mod poller;
pub mod retry;
pub mod video_clip;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{execute_contained, HandlerRegistry, JobContext, JobHandler, ProgressReporter};
pub use heartbeat::{HeartbeatGuard, HeartbeatSupervisor};
pub use logging::{init_tracing, JobLogger};
pub use poller::{PollLoop, PollOutcome};
pub use video_clip::VideoClipHandler;
