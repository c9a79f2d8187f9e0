//! The full question-answering pipeline: plan, retrieve, synthesize.

use super::Synthesizer;
use crate::error::{BlikkError, Result};
use crate::planner::QueryPlanner;
use crate::retrieval::FusionRetriever;
use crate::vector_store::RecordMetadata;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A synthesized answer with the segments it was built from.
#[derive(Debug, Clone)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<RecordMetadata>,
}

/// Runs a question through decomposition, fusion retrieval, and synthesis.
pub struct AnswerEngine {
    planner: Arc<dyn QueryPlanner>,
    retriever: FusionRetriever,
    synthesizer: Arc<dyn Synthesizer>,
}

impl AnswerEngine {
    pub fn new(
        planner: Arc<dyn QueryPlanner>,
        retriever: FusionRetriever,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            planner,
            retriever,
            synthesizer,
        }
    }

    /// Answer a question about the indexed videos.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn ask(&self, query: &str) -> Result<Answer> {
        if query.trim().is_empty() {
            return Err(BlikkError::InvalidInput(
                "Query must not be empty".to_string(),
            ));
        }

        let plan = self.planner.decompose(query).await;
        let retrieved = self.retriever.retrieve(&plan).await;
        debug!("Retrieved {} source segments", retrieved.sources.len());

        let answer = self
            .synthesizer
            .synthesize(query, &retrieved.context)
            .await?;

        Ok(Answer {
            answer,
            sources: retrieved.sources,
        })
    }

    /// The underlying retriever, for raw segment search.
    pub fn retriever(&self) -> &FusionRetriever {
        &self.retriever
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{Embedder, VisualEmbedder};
    use crate::graph_store::KnowledgeGraphStore;
    use crate::planner::QueryPlan;
    use crate::vector_store::{ChunkCatalog, VectorIndex, VectorRecord};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::RwLock;
    use uuid::Uuid;

    struct FakePlanner;

    #[async_trait]
    impl QueryPlanner for FakePlanner {
        async fn decompose(&self, query: &str) -> QueryPlan {
            QueryPlan::fallback(query)
        }
    }

    /// Echoes the context back so tests can inspect what synthesis saw.
    struct EchoSynthesizer;

    #[async_trait]
    impl Synthesizer for EchoSynthesizer {
        async fn synthesize(&self, _query: &str, context: &str) -> Result<String> {
            Ok(format!("Answer based on: {context}"))
        }
    }

    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    struct FakeVisualEmbedder;

    #[async_trait]
    impl VisualEmbedder for FakeVisualEmbedder {
        async fn embed_image(&self, _image_path: &Path) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_text(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn engine_with_one_chunk() -> AnswerEngine {
        let mut text_index = VectorIndex::in_memory(2);
        text_index
            .upsert(vec![VectorRecord {
                id: Uuid::new_v4(),
                vector: vec![1.0, 0.0],
                metadata: RecordMetadata {
                    text: "Time: 0-30s. Transcript: hello. Visual Scene: a stage.".to_string(),
                    start: 0.0,
                    end: 30.0,
                },
            }])
            .unwrap();

        let retriever = FusionRetriever::new(
            Arc::new(RwLock::new(VectorIndex::in_memory(2))),
            Arc::new(RwLock::new(text_index)),
            Arc::new(RwLock::new(KnowledgeGraphStore::in_memory())),
            Arc::new(RwLock::new(ChunkCatalog::in_memory())),
            Arc::new(FakeEmbedder),
            Arc::new(FakeVisualEmbedder),
            3,
        );

        AnswerEngine::new(Arc::new(FakePlanner), retriever, Arc::new(EchoSynthesizer))
    }

    #[tokio::test]
    async fn test_ask_returns_answer_with_sources() {
        let engine = engine_with_one_chunk();
        let answer = engine.ask("what is on stage?").await.unwrap();

        assert!(answer.answer.contains("[0-30]"));
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].start, 0.0);
    }

    #[tokio::test]
    async fn test_ask_rejects_blank_query() {
        let engine = engine_with_one_chunk();
        assert!(engine.ask("   ").await.is_err());
    }
}
