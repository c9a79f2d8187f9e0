//! OpenAI vision-model captioning.

use super::Captioner;
use crate::error::{BlikkError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs, ImageDetail,
    ImageUrlArgs,
};
use async_trait::async_trait;
use base64::Engine;
use std::path::Path;
use tracing::{debug, instrument};

const CAPTION_PROMPT: &str = "Describe this video frame in detail: the setting, visible people \
and objects, any on-screen text, and what appears to be happening.";

/// OpenAI vision-based frame captioner.
pub struct OpenAICaptioner {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAICaptioner {
    /// Create a captioner using the given vision-capable chat model.
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Captioner for OpenAICaptioner {
    #[instrument(skip(self), fields(image = %image_path.display()))]
    async fn caption(&self, image_path: &Path) -> Result<String> {
        let bytes = std::fs::read(image_path)?;
        let data_url = format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        );

        let content = ChatCompletionRequestUserMessageContent::Array(vec![
            ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(CAPTION_PROMPT)
                .build()
                .map_err(|e| BlikkError::Captioning(e.to_string()))?
                .into(),
            ChatCompletionRequestMessageContentPartImageArgs::default()
                .image_url(
                    ImageUrlArgs::default()
                        .url(data_url)
                        .detail(ImageDetail::Low)
                        .build()
                        .map_err(|e| BlikkError::Captioning(e.to_string()))?,
                )
                .build()
                .map_err(|e| BlikkError::Captioning(e.to_string()))?
                .into(),
        ]);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()
                .map_err(|e| BlikkError::Captioning(e.to_string()))?
                .into()])
            .build()
            .map_err(|e| BlikkError::Captioning(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| BlikkError::OpenAI(format!("Caption API error: {e}")))?;

        let caption = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| BlikkError::Captioning("Empty caption response".to_string()))?
            .clone();

        debug!("Generated caption ({} characters)", caption.len());
        Ok(caption)
    }
}
