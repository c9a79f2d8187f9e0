//! Entity/relation extraction from chunk text.
//!
//! The extractor is an external LLM collaborator with a fixed JSON contract;
//! its output is strictly decoded into typed entities and relations before
//! anything downstream sees it.

mod llm;

pub use llm::LlmKnowledgeExtractor;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An extracted entity mention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    /// Entity name as extracted (canonicalized by the graph store).
    pub name: String,
    /// Free-text category (Person, Object, Location, Concept, ...).
    #[serde(rename = "type")]
    pub entity_type: String,
}

/// An extracted relation between two entities of the same chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relation {
    pub source: String,
    pub target: String,
    pub relation: String,
}

/// Entities and relations extracted from one chunk's combined text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

/// Trait for knowledge extraction implementations.
#[async_trait]
pub trait KnowledgeExtractor: Send + Sync {
    /// Extract entities and relations from a chunk's combined text.
    async fn extract(&self, text: &str) -> Result<Extraction>;
}
