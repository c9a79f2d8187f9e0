//! Indexing pipeline for Blikk.
//!
//! One sequential pass over the video's timeline windows. Each chunk's steps
//! run strictly in sequence; extraction failures degrade to sentinels and the
//! loop continues, while storage failures are fatal to the run. Both vector
//! indices, the chunk catalog, and the knowledge graph are persisted after
//! every chunk, so a crash mid-video loses at most the in-flight chunk.

use crate::captioning::{Captioner, OpenAICaptioner};
use crate::chunking::{TimeWindow, TimelineChunker, VideoChunk, NO_CAPTION, NO_SPEECH};
use crate::config::Settings;
use crate::embedding::{ClipEmbedder, Embedder, OpenAIEmbedder, VisualEmbedder};
use crate::error::Result;
use crate::extraction::{KnowledgeExtractor, LlmKnowledgeExtractor};
use crate::graph_store::KnowledgeGraphStore;
use crate::media::{FfmpegMediaSource, MediaSource};
use crate::transcription::{Transcriber, WhisperTranscriber};
use crate::vector_store::{ChunkCatalog, RecordMetadata, VectorIndex, VectorRecord};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, instrument, warn};

/// Result of one indexing run.
#[derive(Debug)]
pub struct IndexReport {
    /// Number of chunks processed.
    pub chunks_indexed: usize,
    /// Total video duration in seconds.
    pub duration_seconds: f64,
    /// Whether the run was stopped early by the progress callback.
    pub cancelled: bool,
}

/// The indexing pipeline with all collaborators injected.
pub struct Indexer {
    chunker: TimelineChunker,
    media: Arc<dyn MediaSource>,
    transcriber: Arc<dyn Transcriber>,
    captioner: Arc<dyn Captioner>,
    text_embedder: Arc<dyn Embedder>,
    visual_embedder: Arc<dyn VisualEmbedder>,
    extractor: Arc<dyn KnowledgeExtractor>,
    visual_index: Arc<RwLock<VectorIndex>>,
    text_index: Arc<RwLock<VectorIndex>>,
    graph: Arc<RwLock<KnowledgeGraphStore>>,
    catalog: Arc<RwLock<ChunkCatalog>>,
    temp_dir: PathBuf,
}

impl Indexer {
    /// Create an indexer with the default collaborators from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let visual_index = Arc::new(RwLock::new(VectorIndex::open(
            &settings.visual_index_path(),
            settings.embedding.visual_dimensions as usize,
        )?));
        let text_index = Arc::new(RwLock::new(VectorIndex::open(
            &settings.text_index_path(),
            settings.embedding.text_dimensions as usize,
        )?));
        let graph = Arc::new(RwLock::new(KnowledgeGraphStore::open(
            &settings.knowledge_graph_path(),
        )?));
        let catalog = Arc::new(RwLock::new(ChunkCatalog::open(
            &settings.chunk_catalog_path(),
        )?));

        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        Ok(Self {
            chunker: TimelineChunker::new(settings.chunking.window_seconds),
            media: Arc::new(FfmpegMediaSource::new()),
            transcriber: Arc::new(WhisperTranscriber::new(&settings.models.transcription)),
            captioner: Arc::new(OpenAICaptioner::new(&settings.models.caption)),
            text_embedder: Arc::new(OpenAIEmbedder::with_config(
                &settings.embedding.text_model,
                settings.embedding.text_dimensions as usize,
            )),
            visual_embedder: Arc::new(ClipEmbedder::new(
                &settings.embedding.visual_endpoint,
                &settings.embedding.visual_model,
                settings.embedding.visual_dimensions as usize,
            )),
            extractor: Arc::new(LlmKnowledgeExtractor::new(&settings.models.extraction)),
            visual_index,
            text_index,
            graph,
            catalog,
            temp_dir,
        })
    }

    /// Create an indexer with custom collaborators and stores.
    #[allow(clippy::too_many_arguments)]
    pub fn with_components(
        chunker: TimelineChunker,
        media: Arc<dyn MediaSource>,
        transcriber: Arc<dyn Transcriber>,
        captioner: Arc<dyn Captioner>,
        text_embedder: Arc<dyn Embedder>,
        visual_embedder: Arc<dyn VisualEmbedder>,
        extractor: Arc<dyn KnowledgeExtractor>,
        visual_index: Arc<RwLock<VectorIndex>>,
        text_index: Arc<RwLock<VectorIndex>>,
        graph: Arc<RwLock<KnowledgeGraphStore>>,
        catalog: Arc<RwLock<ChunkCatalog>>,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            chunker,
            media,
            transcriber,
            captioner,
            text_embedder,
            visual_embedder,
            extractor,
            visual_index,
            text_index,
            graph,
            catalog,
            temp_dir,
        }
    }

    /// Shared handle to the visual index.
    pub fn visual_index(&self) -> Arc<RwLock<VectorIndex>> {
        self.visual_index.clone()
    }

    /// Shared handle to the textual index.
    pub fn text_index(&self) -> Arc<RwLock<VectorIndex>> {
        self.text_index.clone()
    }

    /// Shared handle to the knowledge graph.
    pub fn graph(&self) -> Arc<RwLock<KnowledgeGraphStore>> {
        self.graph.clone()
    }

    /// Shared handle to the chunk catalog.
    pub fn catalog(&self) -> Arc<RwLock<ChunkCatalog>> {
        self.catalog.clone()
    }

    /// Shared handle to the textual embedder.
    pub fn text_embedder(&self) -> Arc<dyn Embedder> {
        self.text_embedder.clone()
    }

    /// Shared handle to the visual embedder.
    pub fn visual_embedder(&self) -> Arc<dyn VisualEmbedder> {
        self.visual_embedder.clone()
    }

    /// Index a video end to end.
    #[instrument(skip(self), fields(video = %video.display()))]
    pub async fn index_video(&self, video: &Path) -> Result<IndexReport> {
        self.index_video_with_progress(video, |_, _| true).await
    }

    /// Index a video, reporting progress after every chunk.
    ///
    /// The callback receives (chunks done, total chunks); returning false
    /// stops the run between chunks.
    pub async fn index_video_with_progress(
        &self,
        video: &Path,
        mut progress: impl FnMut(usize, usize) -> bool + Send,
    ) -> Result<IndexReport> {
        let duration = self.media.duration(video).await?;
        let total = self.chunker.window_count(duration);

        info!(
            "Indexing {} ({duration:.1}s, {total} chunks)",
            video.display()
        );

        let mut done = 0;
        for window in self.chunker.windows(duration) {
            self.process_chunk(video, &window).await?;
            done += 1;

            if !progress(done, total) {
                info!("Indexing cancelled after {done}/{total} chunks");
                return Ok(IndexReport {
                    chunks_indexed: done,
                    duration_seconds: duration,
                    cancelled: true,
                });
            }
        }

        info!("Indexing complete: {done} chunks");
        Ok(IndexReport {
            chunks_indexed: done,
            duration_seconds: duration,
            cancelled: false,
        })
    }

    /// Run one chunk through the full extraction sequence and persist it.
    ///
    /// Extraction steps degrade individually; storage errors propagate.
    async fn process_chunk(&self, video: &Path, window: &TimeWindow) -> Result<()> {
        let temp_audio = self.temp_dir.join(format!("{}.mp3", window.id));
        let temp_frame = self.temp_dir.join(format!("{}.jpg", window.id));

        // 1. Transcript
        let transcript = match self
            .media
            .extract_audio(video, window.start, window.end, &temp_audio)
            .await
        {
            Ok(()) => match self.transcriber.transcribe(&temp_audio).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => NO_SPEECH.to_string(),
                Err(e) => {
                    warn!("Transcription failed for chunk {}: {e}", window.id);
                    NO_SPEECH.to_string()
                }
            },
            Err(e) => {
                warn!("Audio extraction failed for chunk {}: {e}", window.id);
                NO_SPEECH.to_string()
            }
        };

        // 2. Frame, caption, visual embedding
        let mut visual_embedding = None;
        let caption = match self
            .media
            .extract_frame(video, window.mid_point(), &temp_frame)
            .await
        {
            Ok(()) => {
                let caption = match self.captioner.caption(&temp_frame).await {
                    Ok(c) => c,
                    Err(e) => {
                        warn!("Captioning failed for chunk {}: {e}", window.id);
                        NO_CAPTION.to_string()
                    }
                };
                match self.visual_embedder.embed_image(&temp_frame).await {
                    Ok(v) => visual_embedding = Some(v),
                    Err(e) => warn!("Visual embedding failed for chunk {}: {e}", window.id),
                }
                caption
            }
            Err(e) => {
                warn!("Frame extraction failed for chunk {}: {e}", window.id);
                NO_CAPTION.to_string()
            }
        };

        let chunk = VideoChunk {
            window: window.clone(),
            transcript,
            caption,
            visual_embedding,
            text_embedding: None,
        };
        let combined = chunk.combined_text();
        let metadata = RecordMetadata {
            text: combined.clone(),
            start: window.start,
            end: window.end,
        };

        // 3. Channel 1: visual vector
        if let Some(vector) = chunk.visual_embedding.clone() {
            self.visual_index.write().unwrap().upsert(vec![VectorRecord {
                id: window.id,
                vector,
                metadata: metadata.clone(),
            }])?;
        }

        // 4. Channel 2: textual vector
        match self.text_embedder.embed(&combined).await {
            Ok(vector) => {
                self.text_index.write().unwrap().upsert(vec![VectorRecord {
                    id: window.id,
                    vector,
                    metadata: metadata.clone(),
                }])?;
            }
            Err(e) => warn!("Text embedding failed for chunk {}: {e}", window.id),
        }

        // Canonical metadata table for graph-path lookups
        self.catalog.write().unwrap().insert(window.id, metadata)?;

        // 5. Channel 3: knowledge graph
        match self.extractor.extract(&combined).await {
            Ok(extraction) => {
                let mut graph = self.graph.write().unwrap();
                graph.add_knowledge(&extraction.entities, &extraction.relations, window.id);
                graph.save()?;
            }
            Err(e) => warn!("Knowledge extraction failed for chunk {}: {e}", window.id),
        }

        // Cleanup, best effort
        let _ = std::fs::remove_file(&temp_audio);
        let _ = std::fs::remove_file(&temp_frame);

        Ok(())
    }
}
