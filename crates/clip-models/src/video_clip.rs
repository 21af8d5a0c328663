//! Payload of `VIDEO_CLIP` jobs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Payload of a `VIDEO_CLIP` job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoClipPayload {
    /// Clip record id on the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_id: Option<String>,
    /// Clip start in seconds
    #[serde(default)]
    pub start: f64,
    /// Clip end in seconds
    #[serde(default)]
    pub end: f64,
    /// Output layout, parsed with [`LayoutMode::from_str`]
    #[serde(default)]
    pub layout_mode: String,
    /// Publish targets
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Source video
    #[serde(default)]
    pub source: VideoSource,
    /// Per-platform credentials
    #[serde(default)]
    pub auth: AuthData,
    /// Access token injected by the claim endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_access_token: Option<String>,
}

impl VideoClipPayload {
    /// YouTube access token, preferring the per-platform auth block.
    pub fn youtube_token(&self) -> Option<&str> {
        self.auth
            .youtube
            .as_ref()
            .map(|a| a.access_token.as_str())
            .filter(|t| !t.is_empty())
            .or_else(|| {
                self.youtube_access_token
                    .as_deref()
                    .filter(|t| !t.is_empty())
            })
    }

    pub fn layout(&self) -> Result<LayoutMode, LayoutParseError> {
        self.layout_mode.parse()
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Where the source video comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSource {
    #[serde(default)]
    pub youtube_video_id: String,
}

/// Credentials for the publish platforms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<PlatformAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiktok: Option<PlatformAuth>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformAuth {
    #[serde(default)]
    pub access_token: String,
}

impl fmt::Debug for PlatformAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformAuth")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Output layout for the cut clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutMode {
    /// Fill 1080x1920, cropping the overflow
    PortraitCrop,
    /// Fit into 1080x1920, padding the remainder
    PortraitFit,
    /// Keep the source framing
    #[default]
    Landscape,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::PortraitCrop => "portrait-crop",
            LayoutMode::PortraitFit => "portrait-fit",
            LayoutMode::Landscape => "landscape",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = LayoutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "portrait-crop" => Ok(LayoutMode::PortraitCrop),
            "portrait-fit" => Ok(LayoutMode::PortraitFit),
            "landscape" | "" => Ok(LayoutMode::Landscape),
            _ => Err(LayoutParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown layout mode: {0}")]
pub struct LayoutParseError(String);
