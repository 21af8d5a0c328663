//! `VIDEO_CLIP` handler: download from YouTube, cut with FFmpeg, upload.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use clip_media::{cut_video, CutRequest, MediaError, UploadMetadata, YouTubeClient};
use clip_models::{Job, JobId, VideoClipPayload, VIDEO_CLIP_JOB_TYPE};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::executor::{JobContext, JobHandler};

const PROGRESS_STARTED: u8 = 5;
const PROGRESS_DOWNLOADED: u8 = 30;
const PROGRESS_CUT: u8 = 80;
const PROGRESS_DONE: u8 = 100;

const DEFAULT_PRIVACY: &str = "private";
const UNTITLED: &str = "Untitled clip";
const YOUTUBE_PLATFORM: &str = "youtube";

/// Handler for `VIDEO_CLIP` jobs.
pub struct VideoClipHandler {
    youtube: YouTubeClient,
    work_dir: PathBuf,
    ffmpeg_timeout: Duration,
}

impl VideoClipHandler {
    pub fn new(youtube: YouTubeClient, work_dir: impl Into<PathBuf>, ffmpeg_timeout: Duration) -> Self {
        Self {
            youtube,
            work_dir: work_dir.into(),
            ffmpeg_timeout,
        }
    }

    pub fn from_config(config: &WorkerConfig) -> WorkerResult<Self> {
        let youtube = YouTubeClient::new(config.youtube_config())?;
        Ok(Self::new(youtube, &config.work_dir, config.ffmpeg_timeout))
    }

    fn decode(job: &Job) -> WorkerResult<VideoClipPayload> {
        serde_json::from_value(job.payload.clone())
            .map_err(|e| WorkerError::invalid_payload(VIDEO_CLIP_JOB_TYPE, e.to_string()))
    }

    /// Cut while forwarding FFmpeg progress into the 30..80 band.
    async fn cut(&self, request: CutRequest, ctx: &JobContext) -> WorkerResult<PathBuf> {
        let (tx, mut rx) = mpsc::unbounded_channel::<u8>();
        let last_step = Arc::new(AtomicU8::new(PROGRESS_DOWNLOADED));

        let progress = ctx.progress.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(step) = rx.recv().await {
                progress.report(step).await;
            }
        });

        let result = cut_video(&request, move |percent| {
            let step = cut_progress_step(percent);
            if last_step.fetch_max(step, Ordering::SeqCst) < step {
                let _ = tx.send(step);
            }
        })
        .await;

        // The sender lives in the callback, which is gone once the cut returns
        finish_forwarder(forwarder, &ctx.job_id).await;
        Ok(result?)
    }
}

#[async_trait]
impl JobHandler for VideoClipHandler {
    fn job_type(&self) -> &str {
        VIDEO_CLIP_JOB_TYPE
    }

    async fn execute(&self, job: &Job, ctx: &JobContext) -> WorkerResult<Option<Value>> {
        ctx.progress.report(PROGRESS_STARTED).await;

        let payload = Self::decode(job)?;
        let video_id = payload.source.youtube_video_id.trim();
        if video_id.is_empty() {
            return Err(MediaError::invalid_input("videoID is required").into());
        }
        let token = payload
            .youtube_token()
            .ok_or(WorkerError::MissingToken(YOUTUBE_PLATFORM))?;
        let layout = payload
            .layout()
            .map_err(|e| WorkerError::invalid_payload(VIDEO_CLIP_JOB_TYPE, e.to_string()))?;

        for platform in payload
            .platforms
            .iter()
            .filter(|p| !p.eq_ignore_ascii_case(YOUTUBE_PLATFORM))
        {
            ctx.logger
                .log_warning(&format!("publishing to {} is not supported, skipping", platform));
        }

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let job_dir = tempfile::Builder::new()
            .prefix(&format!("job-{}-", path_safe(job.id.as_str())))
            .tempdir_in(&self.work_dir)?;

        ctx.logger.log_progress(&format!("downloading {}", video_id));
        let source = self.youtube.download(video_id, token, job_dir.path()).await?;
        ctx.progress.report(PROGRESS_DOWNLOADED).await;

        ctx.logger.log_progress(&format!(
            "cutting {:.2}s..{:.2}s ({})",
            payload.start, payload.end, layout
        ));
        let request = CutRequest::new(&source, payload.start, payload.end, layout)
            .with_timeout(self.ffmpeg_timeout);
        let clip = self.cut(request, ctx).await?;
        ctx.progress.report(PROGRESS_CUT).await;

        ctx.logger.log_progress("uploading to YouTube");
        let url = self
            .youtube
            .upload(&clip, &upload_metadata(job, &payload), token)
            .await?;
        ctx.progress.report(PROGRESS_DONE).await;

        Ok(Some(json!({ "url": url })))
    }
}

/// Wait for the progress forwarder; its failure never fails the job.
async fn finish_forwarder(forwarder: JoinHandle<()>, job_id: &JobId) {
    if let Err(e) = forwarder.await {
        debug!(job_id = %job_id, "Progress forwarder ended abnormally: {}", e);
    }
}

/// Map cut progress (0..=100) to a 10-point step between 30 and 80.
fn cut_progress_step(percent: f64) -> u8 {
    let percent = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let overall = f64::from(PROGRESS_DOWNLOADED)
        + percent * f64::from(PROGRESS_CUT - PROGRESS_DOWNLOADED) / 100.0;
    ((overall / 10.0).floor() * 10.0) as u8
}

/// Job ids are opaque; keep only characters that are safe in a file name.
fn path_safe(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Title falls back to the clip id; privacy defaults to private.
fn upload_metadata(job: &Job, payload: &VideoClipPayload) -> UploadMetadata {
    let non_empty = |s: &Option<String>| s.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    UploadMetadata {
        title: non_empty(&job.title)
            .or_else(|| non_empty(&payload.clip_id))
            .unwrap_or_else(|| UNTITLED.to_string()),
        description: non_empty(&job.description).unwrap_or_default(),
        category_id: non_empty(&job.category_id).unwrap_or_default(),
        privacy_status: non_empty(&job.privacy_status)
            .unwrap_or_else(|| DEFAULT_PRIVACY.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_progress_band() {
        assert_eq!(cut_progress_step(0.0), 30);
        assert_eq!(cut_progress_step(19.9), 30);
        assert_eq!(cut_progress_step(20.0), 40);
        assert_eq!(cut_progress_step(50.0), 50);
        assert_eq!(cut_progress_step(99.0), 70);
        assert_eq!(cut_progress_step(100.0), 80);
        assert_eq!(cut_progress_step(f64::NAN), 30);
        assert_eq!(cut_progress_step(400.0), 80);
    }

    #[tokio::test]
    async fn test_forwarder_panic_is_absorbed() {
        let forwarder = tokio::spawn(async { panic!("progress channel broke") });
        finish_forwarder(forwarder, &JobId::from_string("j1")).await;
    }

    #[test]
    fn test_path_safe_job_id() {
        assert_eq!(path_safe("tenant/j1"), "tenant_j1");
        assert_eq!(path_safe("../../etc"), "______etc");
        assert_eq!(path_safe("job_42-a"), "job_42-a");
    }

    #[test]
    fn test_upload_metadata_defaults() {
        let job = Job::new("j1", VIDEO_CLIP_JOB_TYPE, json!({}));
        let payload = VideoClipPayload {
            clip_id: Some("clip-42".into()),
            ..Default::default()
        };

        let metadata = upload_metadata(&job, &payload);
        assert_eq!(metadata.title, "clip-42");
        assert_eq!(metadata.privacy_status, "private");
        assert!(metadata.category_id.is_empty());

        let metadata = upload_metadata(&job, &VideoClipPayload::default());
        assert_eq!(metadata.title, "Untitled clip");
    }

    #[test]
    fn test_upload_metadata_from_job() {
        let mut job = Job::new("j1", VIDEO_CLIP_JOB_TYPE, json!({}));
        job.title = Some("Best moment".into());
        job.privacy_status = Some("unlisted".into());
        job.category_id = Some("22".into());

        let metadata = upload_metadata(&job, &VideoClipPayload::default());
        assert_eq!(metadata.title, "Best moment");
        assert_eq!(metadata.privacy_status, "unlisted");
        assert_eq!(metadata.category_id, "22");
    }
}
