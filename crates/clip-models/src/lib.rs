//! Shared data models for the ClipStudio worker.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs as handed out by the backend claim endpoint
//! - Terminal job outcomes
//! - The `VIDEO_CLIP` job payload and layout modes

pub mod job;
pub mod outcome;
pub mod video_clip;

// Re-export common types
pub use job::{Job, JobId, JobStatus, VIDEO_CLIP_JOB_TYPE};
pub use outcome::{JobOutcome, EMPTY_RESULT_MESSAGE};
pub use video_clip::{
    AuthData, LayoutMode, LayoutParseError, PlatformAuth, VideoClipPayload, VideoSource,
};
