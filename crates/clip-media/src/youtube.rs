//! YouTube Data API client.
//!
//! Tokens are per job, so they are passed to each call rather than stored.
//! Download lives in [`crate::download`] and upload in [`crate::upload`].

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::info;

use crate::error::{MediaError, MediaResult};

/// Default Google API host.
pub const DEFAULT_API_URL: &str = "https://www.googleapis.com";

/// Configuration for the YouTube client.
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    /// Base URL for Data API calls
    pub api_base_url: String,
    /// Base URL for media uploads
    pub upload_base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Bound for the whole download stage
    pub download_timeout: Duration,
    /// Bound for sending the clip bytes of one upload
    pub upload_timeout: Duration,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            upload_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            download_timeout: Duration::from_secs(120),
            upload_timeout: Duration::from_secs(1800),
        }
    }
}

impl YouTubeConfig {
    /// Point both API and upload calls at `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        self.upload_base_url = base_url.clone();
        self.api_base_url = base_url;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }
}

/// Client for the YouTube Data API v3.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    pub(crate) http: Client,
    pub(crate) config: YouTubeConfig,
}

impl YouTubeClient {
    /// Create a new client.
    pub fn new(config: YouTubeConfig) -> MediaResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        info!("Created YouTube client for {}", config.api_base_url);

        Ok(Self { http, config })
    }

    pub(crate) fn videos_url(&self) -> String {
        format!("{}/youtube/v3/videos", self.config.api_base_url)
    }

    pub(crate) fn upload_url(&self) -> String {
        format!("{}/upload/youtube/v3/videos", self.config.upload_base_url)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Turn a non-success YouTube response body into a [`MediaError`].
pub(crate) fn parse_youtube_error(action: &str, status: u16, body: &str) -> MediaError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => MediaError::YouTubeApi {
            action: action.to_string(),
            status,
            message: parsed.error.message,
        },
        _ => MediaError::YouTubeStatus {
            action: action.to_string(),
            status,
        },
    }
}

/// Fail with a parsed API error unless the response is 2xx.
pub(crate) async fn ensure_success(action: &str, response: Response) -> MediaResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(parse_youtube_error(action, status, &body))
}

/// Public watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_with_message() {
        let err = parse_youtube_error(
            "video lookup",
            403,
            r#"{"error":{"code":403,"message":"Insufficient Permission"}}"#,
        );
        assert_eq!(
            err.to_string(),
            "youtube api video lookup failed: Insufficient Permission (status 403)"
        );
    }

    #[test]
    fn test_parse_error_without_message() {
        let err = parse_youtube_error("download", 502, "Bad Gateway");
        assert_eq!(err.to_string(), "youtube api download failed with status 502");

        let err = parse_youtube_error("download", 500, r#"{"error":{"code":500}}"#);
        assert!(matches!(err, MediaError::YouTubeStatus { status: 500, .. }));
    }

    #[test]
    fn test_base_url_override() {
        let config = YouTubeConfig::default().with_base_url("http://127.0.0.1:1234/");
        let client = YouTubeClient::new(config).unwrap();
        assert_eq!(client.videos_url(), "http://127.0.0.1:1234/youtube/v3/videos");
        assert_eq!(client.upload_url(), "http://127.0.0.1:1234/upload/youtube/v3/videos");
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(watch_url("abc123"), "https://www.youtube.com/watch?v=abc123");
    }
}
