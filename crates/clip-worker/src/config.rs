//! Worker configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clip_backend::BackendConfig;
use clip_media::youtube::DEFAULT_API_URL;
use clip_media::YouTubeConfig;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Clone)]
pub struct WorkerConfig {
    /// Backend base URL
    pub backend_url: String,
    /// Bearer credential for the internal job API
    pub worker_token: String,
    /// Identity sent in the `x-worker-id` header
    pub worker_id: String,
    /// Sleep after a failed claim
    pub poll_interval: Duration,
    /// Empty-queue sleep is `poll_interval * empty_backoff_factor`
    pub empty_backoff_factor: u32,
    /// Heartbeat period while a job runs
    pub heartbeat_interval: Duration,
    /// Backend request timeout
    pub request_timeout: Duration,
    /// Extra attempts for terminal reports
    pub report_retries: u32,
    /// Work directory for per-job temporary files
    pub work_dir: String,
    /// Bound for the download stage
    pub download_timeout: Duration,
    /// Bound for sending one clip to YouTube
    pub upload_timeout: Duration,
    /// Bound for one FFmpeg cut
    pub ffmpeg_timeout: Duration,
    /// YouTube API base URL
    pub youtube_api_url: String,
    /// Serve Prometheus metrics on this port when set
    pub metrics_port: Option<u16>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8080".to_string(),
            worker_token: String::new(),
            worker_id: "worker-1".to_string(),
            poll_interval: Duration::from_secs(30),
            empty_backoff_factor: 3,
            heartbeat_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            report_retries: 0,
            work_dir: "/tmp/clipstudio".to_string(),
            download_timeout: Duration::from_secs(120),
            upload_timeout: Duration::from_secs(1800),
            ffmpeg_timeout: Duration::from_secs(300),
            youtube_api_url: DEFAULT_API_URL.to_string(),
            metrics_port: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    ///
    /// A missing or empty `WORKER_TOKEN` is the only fatal error; malformed
    /// numbers fall back to their defaults.
    pub fn from_env() -> WorkerResult<Self> {
        let defaults = Self::default();

        let worker_token = std::env::var("WORKER_TOKEN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| WorkerError::config_error("WORKER_TOKEN is required"))?;

        Ok(Self {
            backend_url: env_string("BACKEND_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.backend_url),
            worker_token,
            worker_id: env_string("WORKER_ID").unwrap_or(defaults.worker_id),
            poll_interval: env_secs("POLL_INTERVAL").unwrap_or(defaults.poll_interval),
            empty_backoff_factor: env_parse::<u32>("WORKER_EMPTY_BACKOFF_FACTOR")
                .unwrap_or(defaults.empty_backoff_factor)
                .max(2),
            heartbeat_interval: env_secs("WORKER_HEARTBEAT_SECS")
                .unwrap_or(defaults.heartbeat_interval),
            request_timeout: env_secs("WORKER_REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout),
            report_retries: env_parse("WORKER_REPORT_RETRIES").unwrap_or(defaults.report_retries),
            work_dir: env_string("WORKER_WORK_DIR").unwrap_or(defaults.work_dir),
            download_timeout: env_secs("WORKER_DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or(defaults.download_timeout),
            upload_timeout: env_secs("WORKER_UPLOAD_TIMEOUT_SECS")
                .unwrap_or(defaults.upload_timeout),
            ffmpeg_timeout: env_secs("WORKER_FFMPEG_TIMEOUT_SECS")
                .unwrap_or(defaults.ffmpeg_timeout),
            youtube_api_url: env_string("YOUTUBE_API_URL").unwrap_or(defaults.youtube_api_url),
            metrics_port: env_parse("METRICS_PORT"),
        })
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig::new(&self.backend_url, &self.worker_token, &self.worker_id)
            .with_timeout(self.request_timeout)
    }

    pub fn youtube_config(&self) -> YouTubeConfig {
        YouTubeConfig::default()
            .with_base_url(&self.youtube_api_url)
            .with_download_timeout(self.download_timeout)
            .with_upload_timeout(self.upload_timeout)
    }
}

impl fmt::Debug for WorkerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerConfig")
            .field("backend_url", &self.backend_url)
            .field("worker_token", &"<redacted>")
            .field("worker_id", &self.worker_id)
            .field("poll_interval", &self.poll_interval)
            .field("empty_backoff_factor", &self.empty_backoff_factor)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("request_timeout", &self.request_timeout)
            .field("report_retries", &self.report_retries)
            .field("work_dir", &self.work_dir)
            .field("download_timeout", &self.download_timeout)
            .field("upload_timeout", &self.upload_timeout)
            .field("ffmpeg_timeout", &self.ffmpeg_timeout)
            .field("youtube_api_url", &self.youtube_api_url)
            .field("metrics_port", &self.metrics_port)
            .finish()
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|s| s.parse().ok())
}

/// Positive number of seconds.
fn env_secs(key: &str) -> Option<Duration> {
    env_parse::<u64>(key)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
