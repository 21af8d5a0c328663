//! Clip cutting.
//!
//! Re-encodes a time range of the source into an H.264/AAC MP4, reshaped
//! for the requested [`LayoutMode`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use clip_models::LayoutMode;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Default deadline for one cut.
pub const DEFAULT_CUT_TIMEOUT: Duration = Duration::from_secs(300);

/// Parameters of one cut.
#[derive(Debug, Clone)]
pub struct CutRequest {
    pub input: PathBuf,
    pub start: f64,
    pub end: f64,
    pub layout: LayoutMode,
    pub timeout: Duration,
}

impl CutRequest {
    pub fn new(input: impl AsRef<Path>, start: f64, end: f64, layout: LayoutMode) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            start,
            end,
            layout,
            timeout: DEFAULT_CUT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject requests FFmpeg would choke on.
    pub fn validate(&self) -> MediaResult<()> {
        if self.input.as_os_str().is_empty() {
            return Err(MediaError::invalid_input("input video is required"));
        }

        if !self.start.is_finite() || !self.end.is_finite() || self.start < 0.0 || self.end <= self.start
        {
            return Err(MediaError::invalid_input(format!(
                "invalid time range: start={:.6} end={:.6}",
                self.start, self.end
            )));
        }

        Ok(())
    }

    /// `<dir>/<stem>_cut.mp4` next to the input.
    pub fn output_path(&self) -> PathBuf {
        let stem = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "clip".to_string());
        self.input.with_file_name(format!("{}_cut.mp4", stem))
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Build the FFmpeg invocation for this cut.
    pub fn to_command(&self) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(&self.input, self.output_path())
            .seek(self.start)
            .duration(self.duration());

        if let Some(filter) = layout_filter(self.layout) {
            cmd = cmd.video_filter(filter);
        }

        cmd.map("0:v:0?")
            .map("0:a:0?")
            .video_codec("libx264")
            .preset("veryfast")
            .crf(23)
            .pix_fmt("yuv420p")
            .audio_codec("aac")
            .audio_bitrate("128k")
            .output_args(["-movflags", "+faststart"])
    }
}

/// Video filter for a layout; `None` keeps the source framing.
pub fn layout_filter(layout: LayoutMode) -> Option<&'static str> {
    match layout {
        LayoutMode::PortraitCrop => {
            Some("scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920")
        }
        LayoutMode::PortraitFit => Some(
            "scale=1080:1920:force_original_aspect_ratio=decrease,pad=1080:1920:(ow-iw)/2:(oh-ih)/2",
        ),
        LayoutMode::Landscape => None,
    }
}

/// Cut a clip and return the output path.
///
/// `on_progress` receives the completed share of the cut in percent.
pub async fn cut_video<F>(request: &CutRequest, on_progress: F) -> MediaResult<PathBuf>
where
    F: Fn(f64) + Send + 'static,
{
    request.validate()?;

    let input = tokio::fs::canonicalize(&request.input)
        .await
        .map_err(|_| MediaError::FileNotFound(request.input.clone()))?;
    let request = CutRequest {
        input,
        ..request.clone()
    };

    let output = request.output_path();
    info!(
        "Cutting clip: {} -> {} ({:.2}s..{:.2}s, layout: {})",
        request.input.display(),
        output.display(),
        request.start,
        request.end,
        request.layout
    );

    let total_ms = (request.duration() * 1000.0) as i64;
    FfmpegRunner::new()
        .with_timeout(request.timeout)
        .run_with_progress(&request.to_command(), move |p| {
            on_progress(p.percentage(total_ms))
        })
        .await?;

    if tokio::fs::metadata(&output).await.is_err() {
        return Err(MediaError::OutputMissing(output));
    }

    info!("Clip cut: {}", output.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let cases = [(-1.0, 5.0), (5.0, 5.0), (10.0, 2.0), (f64::NAN, 3.0)];
        for (start, end) in cases {
            let err = CutRequest::new("in.mp4", start, end, LayoutMode::Landscape)
                .validate()
                .unwrap_err();
            assert!(err.to_string().starts_with("invalid time range"), "{}", err);
        }
    }

    #[test]
    fn test_validate_rejects_empty_input() {
        let err = CutRequest::new("", 0.0, 5.0, LayoutMode::Landscape)
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "input video is required");
    }

    #[test]
    fn test_output_path() {
        let request = CutRequest::new("/tmp/job/abc.mp4", 0.0, 5.0, LayoutMode::Landscape);
        assert_eq!(request.output_path(), PathBuf::from("/tmp/job/abc_cut.mp4"));
    }

    #[test]
    fn test_landscape_has_no_filter() {
        let args = CutRequest::new("in.mp4", 1.0, 4.0, LayoutMode::Landscape)
            .to_command()
            .build_args();
        assert!(!args.contains(&"-vf".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
        assert!(args.contains(&"0:a:0?".to_string()));
    }

    #[test]
    fn test_portrait_crop_filter() {
        let args = CutRequest::new("in.mp4", 1.0, 4.0, LayoutMode::PortraitCrop)
            .to_command()
            .build_args();
        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert!(args[vf + 1].contains("crop=1080:1920"));
        assert!(args.contains(&"3.000".to_string()));
    }

    #[tokio::test]
    async fn test_cut_missing_input() {
        let request = CutRequest::new("/nonexistent/in.mp4", 0.0, 1.0, LayoutMode::Landscape);
        let err = cut_video(&request, |_| {}).await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
