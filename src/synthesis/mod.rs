//! Cited answer generation.
//!
//! The synthesizer turns (query, context) into a natural-language answer
//! that cites `[start-end]` timestamp markers from the context. Citation
//! correctness is not validated here; that is a documented limitation.

mod engine;

pub use engine::{Answer, AnswerEngine};

use crate::error::{BlikkError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

const SYNTHESIS_SYSTEM_PROMPT: &str = r#"You are Blikk, an intelligent video assistant.
1. Answer the user query based STRICTLY on the provided context.
2. The context is a list of video segments with timestamps.
3. You must CITE the timestamps for every fact you state.
   Format: "The speaker argues that AI is evolving [10-15]."
4. If the context states that no matching video segments were found, say that
   you cannot find the answer in the video. Never invent content."#;

/// Trait for answer synthesis implementations.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Generate a cited answer from the assembled context.
    async fn synthesize(&self, query: &str, context: &str) -> Result<String>;
}

/// OpenAI chat-model-backed synthesizer.
pub struct OpenAISynthesizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAISynthesizer {
    /// Create a synthesizer using the given chat model.
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Synthesizer for OpenAISynthesizer {
    #[instrument(skip(self, context), fields(query = %query))]
    async fn synthesize(&self, query: &str, context: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYNTHESIS_SYSTEM_PROMPT)
                .build()
                .map_err(|e| BlikkError::Synthesis(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("Context:\n{context}\n\nUser Query: {query}"))
                .build()
                .map_err(|e| BlikkError::Synthesis(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.5)
            .build()
            .map_err(|e| BlikkError::Synthesis(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| BlikkError::OpenAI(format!("Synthesis API error: {e}")))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| BlikkError::Synthesis("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated answer ({} characters)", answer.len());
        Ok(answer)
    }
}
