//! Media collaborators for the clip worker.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Layout-aware clip cutting with a hard deadline
//! - YouTube Data API download and resumable upload

pub mod command;
pub mod cut;
pub mod download;
pub mod error;
pub mod progress;
pub mod upload;
pub mod youtube;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use cut::{cut_video, layout_filter, CutRequest};
pub use error::{MediaError, MediaResult};
pub use progress::FfmpegProgress;
pub use upload::UploadMetadata;
pub use youtube::{watch_url, YouTubeClient, YouTubeConfig};
