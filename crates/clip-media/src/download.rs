//! Source video download through the YouTube Data API.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::youtube::{ensure_success, YouTubeClient};

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

impl YouTubeClient {
    /// Download `video_id` into `dir/<video_id>.mp4`.
    ///
    /// The access check and the transfer together are bounded by the
    /// configured download timeout. A partial file is removed on failure.
    pub async fn download(
        &self,
        video_id: &str,
        access_token: &str,
        dir: &Path,
    ) -> MediaResult<PathBuf> {
        if video_id.trim().is_empty() {
            return Err(MediaError::invalid_input("videoID is required"));
        }
        if access_token.is_empty() {
            return Err(MediaError::invalid_input(
                "youtube access token is required to download videos via the YouTube API",
            ));
        }

        let output = dir.join(format!("{}.mp4", video_id));
        let deadline = self.config.download_timeout;

        let result = tokio::time::timeout(deadline, async {
            self.ensure_video_access(video_id, access_token).await?;
            self.fetch_media(video_id, access_token, &output).await
        })
        .await
        .unwrap_or_else(|_| Err(MediaError::timeout("download", deadline.as_secs())));

        if let Err(e) = result {
            if tokio::fs::remove_file(&output).await.is_ok() {
                debug!("Removed partial download {}", output.display());
            }
            return Err(e);
        }

        Ok(output)
    }

    async fn ensure_video_access(&self, video_id: &str, access_token: &str) -> MediaResult<()> {
        let response = self
            .http
            .get(self.videos_url())
            .query(&[("part", "id"), ("id", video_id)])
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = ensure_success("video lookup", response).await?;
        let list: VideoListResponse = serde_json::from_str(&response.text().await?)?;

        if list.items.is_empty() {
            return Err(MediaError::VideoNotAccessible(video_id.to_string()));
        }

        Ok(())
    }

    async fn fetch_media(&self, video_id: &str, access_token: &str, output: &Path) -> MediaResult<()> {
        let response = self
            .http
            .get(self.videos_url())
            .query(&[("id", video_id), ("alt", "media")])
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = ensure_success("download", response).await?;

        let mut file = tokio::fs::File::create(output).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            warn!("Download of {} returned an empty body", video_id);
        }

        info!("Downloaded {} ({} bytes) to {}", video_id, written, output.display());
        Ok(())
    }
}
