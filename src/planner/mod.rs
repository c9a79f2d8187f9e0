//! Query decomposition.
//!
//! Splits a natural-language question into a visual sub-query, a keyword
//! sub-query, and an entity list before retrieval. Planning never fails the
//! overall query: any collaborator error or malformed reply degrades to the
//! deterministic fallback plan.

use crate::error::{BlikkError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

const PLANNER_SYSTEM_PROMPT: &str = r#"You are a query planner for a multi-modal video retrieval system.
The user will ask a question about a video. Generate 3 distinct search strategies:

1. visual_query: a short, descriptive sentence describing a SCENE to look for visually (e.g., "A red car driving in the rain").
2. keyword_query: semantic keywords for transcript search (e.g., "climate change carbon emissions").
3. entities: a list of specific proper nouns or key concepts to look up in the knowledge graph.

Output strictly valid JSON:
{
  "visual_query": "string",
  "keyword_query": "string",
  "entities": ["string", "string"]
}"#;

/// A decomposed query: one sub-query per retrieval channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryPlan {
    pub visual_query: String,
    pub keyword_query: String,
    pub entities: Vec<String>,
}

impl QueryPlan {
    /// The deterministic fallback: both sub-queries equal the raw question,
    /// no entities.
    pub fn fallback(query: &str) -> Self {
        Self {
            visual_query: query.to_string(),
            keyword_query: query.to_string(),
            entities: Vec::new(),
        }
    }
}

/// Strictly decode a collaborator reply into a plan.
///
/// Requires valid JSON with non-empty `visual_query` and `keyword_query`;
/// `entities` may be empty. Anything else is rejected so the caller falls
/// back instead of propagating a half-formed plan.
pub fn parse_plan(raw: &str) -> Option<QueryPlan> {
    let plan: QueryPlan = serde_json::from_str(raw).ok()?;

    if plan.visual_query.trim().is_empty() || plan.keyword_query.trim().is_empty() {
        return None;
    }

    Some(plan)
}

/// Trait for query decomposition implementations.
#[async_trait]
pub trait QueryPlanner: Send + Sync {
    /// Decompose a question into a [`QueryPlan`]. Never fails; on any error
    /// the fallback plan is returned.
    async fn decompose(&self, query: &str) -> QueryPlan;
}

/// LLM-backed query planner.
pub struct LlmQueryPlanner {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl LlmQueryPlanner {
    /// Create a planner using the given chat model.
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }

    async fn try_decompose(&self, query: &str) -> Result<QueryPlan> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(PLANNER_SYSTEM_PROMPT)
                .build()
                .map_err(|e| BlikkError::Planning(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("User Query: {query}"))
                .build()
                .map_err(|e| BlikkError::Planning(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .temperature(0.3)
            .build()
            .map_err(|e| BlikkError::Planning(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| BlikkError::OpenAI(format!("Planner API error: {e}")))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| BlikkError::Planning("Empty planner response".to_string()))?;

        parse_plan(content)
            .ok_or_else(|| BlikkError::Planning("Malformed decomposition".to_string()))
    }
}

/// Resolve a decomposition attempt: a collaborator error never surfaces,
/// it degrades to the fallback plan for the original query.
fn plan_or_fallback(query: &str, attempt: Result<QueryPlan>) -> QueryPlan {
    match attempt {
        Ok(plan) => {
            debug!(
                "Decomposed into visual={:?} keyword={:?} entities={:?}",
                plan.visual_query, plan.keyword_query, plan.entities
            );
            plan
        }
        Err(e) => {
            warn!("Query decomposition failed, using fallback plan: {e}");
            QueryPlan::fallback(query)
        }
    }
}

#[async_trait]
impl QueryPlanner for LlmQueryPlanner {
    #[instrument(skip(self), fields(query = %query))]
    async fn decompose(&self, query: &str) -> QueryPlan {
        plan_or_fallback(query, self.try_decompose(query).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_plan() {
        let raw = r#"{
            "visual_query": "a red car in the rain",
            "keyword_query": "car rain driving",
            "entities": ["red car"]
        }"#;

        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.visual_query, "a red car in the rain");
        assert_eq!(plan.entities, vec!["red car".to_string()]);
    }

    #[test]
    fn test_parse_allows_empty_entities() {
        let raw = r#"{"visual_query": "a scene", "keyword_query": "words", "entities": []}"#;
        assert!(parse_plan(raw).is_some());
    }

    #[test]
    fn test_parse_rejects_empty_subqueries() {
        let raw = r#"{"visual_query": "", "keyword_query": "words", "entities": []}"#;
        assert!(parse_plan(raw).is_none());

        let raw = r#"{"visual_query": "a scene", "keyword_query": "  ", "entities": []}"#;
        assert!(parse_plan(raw).is_none());
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(parse_plan("not json at all").is_none());
        assert!(parse_plan(r#"{"visual_query": "a scene"}"#).is_none());
    }

    #[test]
    fn test_fallback_plan() {
        let plan = QueryPlan::fallback("what happens at the end?");
        assert_eq!(plan.visual_query, "what happens at the end?");
        assert_eq!(plan.keyword_query, "what happens at the end?");
        assert!(plan.entities.is_empty());
    }

    #[test]
    fn test_collaborator_error_degrades_to_fallback() {
        let query = "who is on stage?";
        let plan = plan_or_fallback(
            query,
            Err(BlikkError::Planning("collaborator unavailable".into())),
        );

        assert_eq!(plan, QueryPlan::fallback(query));
        assert_eq!(plan.visual_query, query);
        assert_eq!(plan.keyword_query, query);
        assert!(plan.entities.is_empty());
    }

    #[test]
    fn test_successful_decomposition_passes_through() {
        let decomposed = QueryPlan {
            visual_query: "a stage with lights".to_string(),
            keyword_query: "stage performer".to_string(),
            entities: vec!["performer".to_string()],
        };

        let plan = plan_or_fallback("who is on stage?", Ok(decomposed.clone()));
        assert_eq!(plan, decomposed);
    }
}
