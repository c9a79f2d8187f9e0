//! LLM-based knowledge extraction.

use super::{Extraction, KnowledgeExtractor};
use crate::error::{BlikkError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a knowledge graph extractor for a video understanding system.
Analyze the provided video transcript and visual description.

Tasks:
1. Identify key ENTITIES (People, Objects, Locations, Concepts, Events).
2. Identify RELATIONSHIPS between these entities (e.g., "is wearing", "is located in", "discusses").

Output strictly valid JSON with this schema:
{
  "entities": [{"name": "Entity Name", "type": "Person/Object/Location/Concept"}],
  "relations": [{"source": "Entity A", "target": "Entity B", "relation": "verb_phrase"}]
}"#;

/// Knowledge extractor backed by an OpenAI chat model in JSON mode.
pub struct LlmKnowledgeExtractor {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl LlmKnowledgeExtractor {
    /// Create an extractor using the given chat model.
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl KnowledgeExtractor for LlmKnowledgeExtractor {
    #[instrument(skip(self, text))]
    async fn extract(&self, text: &str) -> Result<Extraction> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(EXTRACTION_SYSTEM_PROMPT)
                .build()
                .map_err(|e| BlikkError::Extraction(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("Context: {text}"))
                .build()
                .map_err(|e| BlikkError::Extraction(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .temperature(0.1)
            .build()
            .map_err(|e| BlikkError::Extraction(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| BlikkError::OpenAI(format!("Extraction API error: {e}")))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| BlikkError::Extraction("Empty extraction response".to_string()))?;

        let extraction: Extraction = serde_json::from_str(content)
            .map_err(|e| BlikkError::Extraction(format!("Malformed extraction JSON: {e}")))?;

        debug!(
            "Extracted {} entities, {} relations",
            extraction.entities.len(),
            extraction.relations.len()
        );

        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_decodes_strictly() {
        let raw = r#"{
            "entities": [{"name": "Red Car", "type": "Object"}],
            "relations": [{"source": "Red Car", "target": "Rain", "relation": "drives in"}]
        }"#;

        let extraction: Extraction = serde_json::from_str(raw).unwrap();
        assert_eq!(extraction.entities[0].name, "Red Car");
        assert_eq!(extraction.relations[0].relation, "drives in");
    }

    #[test]
    fn test_extraction_tolerates_missing_fields() {
        let extraction: Extraction = serde_json::from_str("{}").unwrap();
        assert!(extraction.entities.is_empty());
        assert!(extraction.relations.is_empty());
    }
}
