//! Media probing and extraction collaborators.
//!
//! Video decoding mechanics live behind the [`MediaSource`] trait; the
//! default implementation shells out to ffprobe/ffmpeg.

mod ffmpeg;

pub use ffmpeg::FfmpegMediaSource;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for media probing and per-chunk extraction.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Total duration of the video in seconds.
    async fn duration(&self, video: &Path) -> Result<f64>;

    /// Extract the audio of `[start, end)` as MP3 into `dest`.
    async fn extract_audio(&self, video: &Path, start: f64, end: f64, dest: &Path) -> Result<()>;

    /// Extract a single frame at time `at` as JPEG into `dest`.
    async fn extract_frame(&self, video: &Path, at: f64, dest: &Path) -> Result<()>;
}
