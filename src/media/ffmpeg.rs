//! ffmpeg/ffprobe-based media extraction.

use super::MediaSource;
use crate::error::{BlikkError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Media source implementation shelling out to ffmpeg and ffprobe.
pub struct FfmpegMediaSource;

impl FfmpegMediaSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegMediaSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSource for FfmpegMediaSource {
    /// Queries the duration of a media file using ffprobe with JSON output.
    #[instrument(skip(self), fields(video = %video.display()))]
    async fn duration(&self, video: &Path) -> Result<f64> {
        let result = Command::new("ffprobe")
            .arg("-v").arg("quiet")
            .arg("-print_format").arg("json")
            .arg("-show_format")
            .arg(video)
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlikkError::ToolNotFound("ffprobe".into()));
            }
            Err(e) => {
                return Err(BlikkError::Media(format!("ffprobe failed: {e}")));
            }
        };

        if !output.status.success() {
            return Err(BlikkError::Media("ffprobe returned error".into()));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        let parsed: serde_json::Value = serde_json::from_str(&json_str)
            .map_err(|_| BlikkError::Media("Invalid ffprobe output".into()))?;

        parsed["format"]["duration"]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| BlikkError::Media("Could not determine video duration".into()))
    }

    #[instrument(skip(self, video, dest))]
    async fn extract_audio(&self, video: &Path, start: f64, end: f64, dest: &Path) -> Result<()> {
        debug!("Extracting audio segment {:.1}-{:.1}s", start, end);

        let result = Command::new("ffmpeg")
            .arg("-ss").arg(format!("{start:.3}"))
            .arg("-i").arg(video)
            .arg("-t").arg(format!("{:.3}", end - start))
            .arg("-vn")
            .arg("-codec:a").arg("libmp3lame")
            .arg("-qscale:a").arg("2")
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg(dest)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(BlikkError::Media(format!("Audio extraction failed: {err}")))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlikkError::ToolNotFound("ffmpeg".into()))
            }
            Err(e) => Err(BlikkError::Media(format!("ffmpeg error: {e}"))),
        }
    }

    #[instrument(skip(self, video, dest))]
    async fn extract_frame(&self, video: &Path, at: f64, dest: &Path) -> Result<()> {
        debug!("Extracting frame at {:.1}s", at);

        let result = Command::new("ffmpeg")
            .arg("-ss").arg(format!("{at:.3}"))
            .arg("-i").arg(video)
            .arg("-frames:v").arg("1")
            .arg("-qscale:v").arg("2")
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg(dest)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(out) if out.status.success() && dest.exists() => Ok(()),
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(BlikkError::Media(format!("Frame extraction failed: {err}")))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlikkError::ToolNotFound("ffmpeg".into()))
            }
            Err(e) => Err(BlikkError::Media(format!("ffmpeg error: {e}"))),
        }
    }
}
