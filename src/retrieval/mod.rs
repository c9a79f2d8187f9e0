//! Fusion retrieval across the visual, textual, and graph representations.
//!
//! Candidate chunks from three independent lookups are deduplicated by chunk
//! id, ordered by start time, and assembled into a timestamp-cited context
//! string for answer synthesis.

use crate::embedding::{Embedder, VisualEmbedder};
use crate::graph_store::KnowledgeGraphStore;
use crate::planner::QueryPlan;
use crate::vector_store::{ChunkCatalog, RecordMetadata, VectorIndex};
use std::sync::{Arc, RwLock};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Context returned when no representation produced a candidate. An explicit
/// sentinel rather than an empty string, so the synthesizer can say "not
/// found" instead of hallucinating.
pub const EMPTY_CONTEXT: &str =
    "No matching video segments were found for this query.";

/// The fused retrieval result: a cited context string plus its time-ordered
/// sources.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    pub context: String,
    pub sources: Vec<RecordMetadata>,
}

impl RetrievedContext {
    /// Whether retrieval found nothing.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Runs the three lookups and fuses their candidates.
pub struct FusionRetriever {
    visual_index: Arc<RwLock<VectorIndex>>,
    text_index: Arc<RwLock<VectorIndex>>,
    graph: Arc<RwLock<KnowledgeGraphStore>>,
    catalog: Arc<RwLock<ChunkCatalog>>,
    text_embedder: Arc<dyn Embedder>,
    visual_embedder: Arc<dyn VisualEmbedder>,
    top_k: usize,
}

impl FusionRetriever {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        visual_index: Arc<RwLock<VectorIndex>>,
        text_index: Arc<RwLock<VectorIndex>>,
        graph: Arc<RwLock<KnowledgeGraphStore>>,
        catalog: Arc<RwLock<ChunkCatalog>>,
        text_embedder: Arc<dyn Embedder>,
        visual_embedder: Arc<dyn VisualEmbedder>,
        top_k: usize,
    ) -> Self {
        Self {
            visual_index,
            text_index,
            graph,
            catalog,
            text_embedder,
            visual_embedder,
            top_k,
        }
    }

    /// Retrieve and fuse candidates for a decomposed query.
    ///
    /// Each path is individually best-effort: an embedding or lookup failure
    /// is logged and that path skipped, never aborting the whole query. The
    /// textual path runs after the visual path and overwrites metadata for
    /// ids both produced (last-writer-wins, deterministic).
    #[instrument(skip(self, plan))]
    pub async fn retrieve(&self, plan: &QueryPlan) -> RetrievedContext {
        let mut candidates: Vec<(Uuid, RecordMetadata)> = Vec::new();

        // 1. Visual path
        if !plan.visual_query.trim().is_empty() {
            match self.visual_embedder.embed_text(&plan.visual_query).await {
                Ok(vector) => {
                    let index = self.visual_index.read().unwrap();
                    for hit in index.query(&vector, self.top_k) {
                        merge_candidate(&mut candidates, hit.id, hit.metadata);
                    }
                }
                Err(e) => warn!("Visual path skipped: {e}"),
            }
        }

        // 2. Textual path
        match self.text_embedder.embed(&plan.keyword_query).await {
            Ok(vector) => {
                let index = self.text_index.read().unwrap();
                for hit in index.query(&vector, self.top_k) {
                    merge_candidate(&mut candidates, hit.id, hit.metadata);
                }
            }
            Err(e) => warn!("Textual path skipped: {e}"),
        }

        // 3. Graph path
        if !plan.entities.is_empty() {
            let chunk_ids = {
                let graph = self.graph.read().unwrap();
                graph.retrieve_context(&plan.entities, 1)
            };

            let catalog = self.catalog.read().unwrap();
            for id in chunk_ids {
                if candidates.iter().any(|(existing, _)| *existing == id) {
                    continue;
                }
                // Graph-discovered ids resolve metadata through the chunk
                // catalog; ids missing from it contribute nothing.
                if let Some(metadata) = catalog.get(&id) {
                    candidates.push((id, metadata.clone()));
                }
            }
        }

        debug!("Fused {} candidate chunks", candidates.len());

        if candidates.is_empty() {
            return RetrievedContext {
                context: EMPTY_CONTEXT.to_string(),
                sources: Vec::new(),
            };
        }

        let mut sources: Vec<RecordMetadata> =
            candidates.into_iter().map(|(_, meta)| meta).collect();

        // Stable sort: incomparable start values keep insertion order.
        sources.sort_by(|a, b| {
            a.start
                .partial_cmp(&b.start)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let context = sources
            .iter()
            .map(|m| format!("[{}-{}] {}", m.start, m.end, m.text))
            .collect::<Vec<_>>()
            .join("\n");

        RetrievedContext { context, sources }
    }
}

/// Insert or replace a candidate, keeping its first-insertion position.
fn merge_candidate(candidates: &mut Vec<(Uuid, RecordMetadata)>, id: Uuid, metadata: RecordMetadata) {
    match candidates.iter_mut().find(|(existing, _)| *existing == id) {
        Some(entry) => entry.1 = metadata,
        None => candidates.push((id, metadata)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::extraction::Entity;
    use crate::vector_store::VectorRecord;
    use async_trait::async_trait;
    use std::path::Path;

    /// Text embedder returning a fixed vector.
    struct FakeEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        fn dimensions(&self) -> usize {
            self.0.len()
        }
    }

    /// Visual embedder returning a fixed vector for both towers.
    struct FakeVisualEmbedder(Vec<f32>);

    #[async_trait]
    impl VisualEmbedder for FakeVisualEmbedder {
        async fn embed_image(&self, _image_path: &Path) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        async fn embed_text(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        fn dimensions(&self) -> usize {
            self.0.len()
        }
    }

    /// Embedder that always fails, for path-skipping tests.
    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(crate::BlikkError::Embedding("unavailable".into()))
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn meta(start: f64) -> RecordMetadata {
        RecordMetadata {
            text: format!("segment starting at {start}"),
            start,
            end: start + 30.0,
        }
    }

    fn record(id: Uuid, vector: Vec<f32>, start: f64) -> VectorRecord {
        VectorRecord {
            id,
            vector,
            metadata: meta(start),
        }
    }

    fn retriever_with(
        visual: VectorIndex,
        text: VectorIndex,
        graph: KnowledgeGraphStore,
        catalog: ChunkCatalog,
        text_embedder: Arc<dyn Embedder>,
        visual_embedder: Arc<dyn VisualEmbedder>,
    ) -> FusionRetriever {
        FusionRetriever::new(
            Arc::new(RwLock::new(visual)),
            Arc::new(RwLock::new(text)),
            Arc::new(RwLock::new(graph)),
            Arc::new(RwLock::new(catalog)),
            text_embedder,
            visual_embedder,
            3,
        )
    }

    #[tokio::test]
    async fn test_fusion_orders_by_start_time() {
        let mut text_index = VectorIndex::in_memory(2);
        text_index
            .upsert(vec![
                record(Uuid::new_v4(), vec![1.0, 0.0], 20.0),
                record(Uuid::new_v4(), vec![0.9, 0.1], 0.0),
                record(Uuid::new_v4(), vec![0.8, 0.2], 10.0),
            ])
            .unwrap();

        let retriever = retriever_with(
            VectorIndex::in_memory(2),
            text_index,
            KnowledgeGraphStore::in_memory(),
            ChunkCatalog::in_memory(),
            Arc::new(FakeEmbedder(vec![1.0, 0.0])),
            Arc::new(FakeVisualEmbedder(vec![1.0, 0.0])),
        );

        let result = retriever.retrieve(&QueryPlan::fallback("anything")).await;

        let starts: Vec<f64> = result.sources.iter().map(|m| m.start).collect();
        assert_eq!(starts, vec![0.0, 10.0, 20.0]);

        let lines: Vec<&str> = result.context.lines().collect();
        assert!(lines[0].starts_with("[0-30]"));
        assert!(lines[1].starts_with("[10-40]"));
        assert!(lines[2].starts_with("[20-50]"));
    }

    #[tokio::test]
    async fn test_textual_hit_overwrites_visual_metadata() {
        let id = Uuid::new_v4();

        let mut visual_index = VectorIndex::in_memory(2);
        visual_index
            .upsert(vec![VectorRecord {
                id,
                vector: vec![1.0, 0.0],
                metadata: RecordMetadata {
                    text: "visual copy".to_string(),
                    start: 0.0,
                    end: 30.0,
                },
            }])
            .unwrap();

        let mut text_index = VectorIndex::in_memory(2);
        text_index
            .upsert(vec![VectorRecord {
                id,
                vector: vec![1.0, 0.0],
                metadata: RecordMetadata {
                    text: "textual copy".to_string(),
                    start: 0.0,
                    end: 30.0,
                },
            }])
            .unwrap();

        let retriever = retriever_with(
            visual_index,
            text_index,
            KnowledgeGraphStore::in_memory(),
            ChunkCatalog::in_memory(),
            Arc::new(FakeEmbedder(vec![1.0, 0.0])),
            Arc::new(FakeVisualEmbedder(vec![1.0, 0.0])),
        );

        let result = retriever.retrieve(&QueryPlan::fallback("anything")).await;

        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].text, "textual copy");
    }

    #[tokio::test]
    async fn test_empty_result_yields_sentinel() {
        let retriever = retriever_with(
            VectorIndex::in_memory(2),
            VectorIndex::in_memory(2),
            KnowledgeGraphStore::in_memory(),
            ChunkCatalog::in_memory(),
            Arc::new(FakeEmbedder(vec![1.0, 0.0])),
            Arc::new(FakeVisualEmbedder(vec![1.0, 0.0])),
        );

        let result = retriever.retrieve(&QueryPlan::fallback("anything")).await;

        assert!(result.is_empty());
        assert_eq!(result.context, EMPTY_CONTEXT);
        assert!(!result.context.is_empty());
    }

    #[tokio::test]
    async fn test_graph_path_resolves_through_catalog() {
        let chunk_id = Uuid::new_v4();

        let mut graph = KnowledgeGraphStore::in_memory();
        graph.add_knowledge(
            &[Entity {
                name: "Turbine".to_string(),
                entity_type: "Object".to_string(),
            }],
            &[],
            chunk_id,
        );

        let mut catalog = ChunkCatalog::in_memory();
        catalog.insert(chunk_id, meta(60.0)).unwrap();

        let retriever = retriever_with(
            VectorIndex::in_memory(2),
            VectorIndex::in_memory(2),
            graph,
            catalog,
            Arc::new(FakeEmbedder(vec![1.0, 0.0])),
            Arc::new(FakeVisualEmbedder(vec![1.0, 0.0])),
        );

        let plan = QueryPlan {
            visual_query: "a turbine".to_string(),
            keyword_query: "turbine".to_string(),
            entities: vec!["turbine".to_string()],
        };

        let result = retriever.retrieve(&plan).await;

        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].start, 60.0);
        assert!(result.context.starts_with("[60-90]"));
    }

    #[tokio::test]
    async fn test_failing_text_path_is_skipped_not_fatal() {
        let chunk_id = Uuid::new_v4();

        let mut graph = KnowledgeGraphStore::in_memory();
        graph.add_knowledge(
            &[Entity {
                name: "Bridge".to_string(),
                entity_type: "Location".to_string(),
            }],
            &[],
            chunk_id,
        );

        let mut catalog = ChunkCatalog::in_memory();
        catalog.insert(chunk_id, meta(30.0)).unwrap();

        let retriever = retriever_with(
            VectorIndex::in_memory(2),
            VectorIndex::in_memory(2),
            graph,
            catalog,
            Arc::new(FailingEmbedder),
            Arc::new(FakeVisualEmbedder(vec![1.0, 0.0])),
        );

        let plan = QueryPlan {
            visual_query: String::new(),
            keyword_query: "bridge".to_string(),
            entities: vec!["bridge".to_string()],
        };

        let result = retriever.retrieve(&plan).await;
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].start, 30.0);
    }
}
