//! OpenAI Whisper transcription implementation.

use super::Transcriber;
use crate::error::{BlikkError, Result};
use crate::openai::create_client;
use async_openai::types::{AudioInput, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl WhisperTranscriber {
    /// Create a transcriber using the given speech-to-text model.
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "segment.mp3".to_string()),
                std::fs::read(audio_path)?,
            ))
            .model(&self.model)
            .build()
            .map_err(|e| BlikkError::Transcription(format!("Failed to build request: {e}")))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| BlikkError::OpenAI(format!("Transcription API error: {e}")))?;

        debug!("Transcribed {} characters", response.text.len());
        Ok(response.text)
    }
}
