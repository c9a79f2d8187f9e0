//! Speech-to-text collaborator.

mod whisper;

pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription implementations.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file to plain text. An empty transcript is a
    /// valid result (silence); callers substitute the no-speech sentinel.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}
