//! Resumable upload to YouTube.

use std::path::Path;

use futures::stream;
use reqwest::Body;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::error::{MediaError, MediaResult};
use crate::youtube::{ensure_success, watch_url, YouTubeClient};

/// Read size for streaming the clip body.
const UPLOAD_CHUNK_SIZE: usize = 256 * 1024;

/// Snippet and status metadata for an upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub privacy_status: String,
}

impl UploadMetadata {
    /// Request body for `videos.insert`.
    pub fn to_resource(&self) -> serde_json::Value {
        let mut snippet = json!({
            "title": self.title,
            "description": self.description,
        });
        if !self.category_id.is_empty() {
            snippet["categoryId"] = json!(self.category_id);
        }

        json!({
            "snippet": snippet,
            "status": { "privacyStatus": self.privacy_status },
        })
    }
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    id: String,
}

impl YouTubeClient {
    /// Upload `path` and return the public watch URL.
    pub async fn upload(
        &self,
        path: &Path,
        metadata: &UploadMetadata,
        access_token: &str,
    ) -> MediaResult<String> {
        if access_token.is_empty() {
            return Err(MediaError::invalid_input("youtube access token is required to upload"));
        }

        let file = File::open(path)
            .await
            .map_err(|_| MediaError::FileNotFound(path.to_path_buf()))?;
        let size = file.metadata().await?.len();

        // Open the session
        let response = self
            .http
            .post(self.upload_url())
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(access_token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", size.to_string())
            .json(&metadata.to_resource())
            .send()
            .await?;

        let response = ensure_success("upload", response).await?;
        let session_uri = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| MediaError::upload_failed("upload session has no Location header"))?;

        // Send the file under its own deadline; the client timeout is sized for API calls
        let deadline = self.config.upload_timeout;
        let response = self
            .http
            .put(&session_uri)
            .timeout(deadline)
            .bearer_auth(access_token)
            .header(reqwest::header::CONTENT_TYPE, "video/mp4")
            .header(reqwest::header::CONTENT_LENGTH, size)
            .body(file_body(file))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MediaError::timeout("upload", deadline.as_secs())
                } else {
                    e.into()
                }
            })?;

        let response = ensure_success("upload", response).await?;
        let inserted: InsertResponse = serde_json::from_str(&response.text().await?)?;
        if inserted.id.is_empty() {
            return Err(MediaError::upload_failed("upload response has no video id"));
        }

        info!("Uploaded {} ({} bytes) as video {}", path.display(), size, inserted.id);
        Ok(watch_url(&inserted.id))
    }
}

/// Stream `file` in fixed-size chunks instead of reading it into memory.
fn file_body(file: File) -> Body {
    let chunks = stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok::<_, std::io::Error>(None);
        }
        buf.truncate(n);
        Ok(Some((buf, file)))
    });
    Body::wrap_stream(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_omits_empty_category() {
        let metadata = UploadMetadata {
            title: "My clip".into(),
            description: String::new(),
            category_id: String::new(),
            privacy_status: "private".into(),
        };
        let resource = metadata.to_resource();
        assert_eq!(resource["snippet"]["title"], "My clip");
        assert!(resource["snippet"].get("categoryId").is_none());
        assert_eq!(resource["status"]["privacyStatus"], "private");
    }

    #[test]
    fn test_resource_includes_category() {
        let metadata = UploadMetadata {
            category_id: "22".into(),
            ..Default::default()
        };
        assert_eq!(metadata.to_resource()["snippet"]["categoryId"], "22");
    }
}
