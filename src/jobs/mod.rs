//! Background indexing jobs.
//!
//! Uploads are indexed by a single worker task fed from a bounded channel,
//! so concurrent uploads never index in parallel and store writes stay
//! serialized. Every job is observable through the registry and can be
//! cancelled between chunks.

use crate::error::{BlikkError, Result};
use crate::indexer::Indexer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

const QUEUE_CAPACITY: usize = 64;

/// Lifecycle of an indexing job.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "state")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed { error: String },
    Cancelled,
}

/// A point-in-time snapshot of one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub id: Uuid,
    #[serde(flatten)]
    pub state: JobState,
    pub video: PathBuf,
    pub chunks_done: usize,
    pub total_chunks: usize,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

struct JobRecord {
    status: JobStatus,
    cancel: Arc<AtomicBool>,
}

type Registry = Arc<RwLock<HashMap<Uuid, JobRecord>>>;

/// Handle to the indexing worker. Cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<Uuid>,
    registry: Registry,
}

impl JobQueue {
    /// Start the worker task and return a handle to it.
    pub fn start(indexer: Arc<Indexer>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let registry: Registry = Arc::new(RwLock::new(HashMap::new()));

        tokio::spawn(run_worker(indexer, rx, registry.clone()));

        Self { tx, registry }
    }

    /// Enqueue a video for indexing and return its job id.
    pub async fn submit(&self, video: PathBuf) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.registry.write().unwrap().insert(
            id,
            JobRecord {
                status: JobStatus {
                    id,
                    state: JobState::Queued,
                    video,
                    chunks_done: 0,
                    total_chunks: 0,
                    submitted_at: now,
                    updated_at: now,
                },
                cancel: Arc::new(AtomicBool::new(false)),
            },
        );

        self.tx
            .send(id)
            .await
            .map_err(|_| BlikkError::Storage("Indexing worker is not running".to_string()))?;

        info!("Queued indexing job {id}");
        Ok(id)
    }

    /// Snapshot a job's status, if it exists.
    pub fn status(&self, id: Uuid) -> Option<JobStatus> {
        self.registry
            .read()
            .unwrap()
            .get(&id)
            .map(|r| r.status.clone())
    }

    /// Request cancellation. Queued jobs are skipped when the worker reaches
    /// them; running jobs stop after the current chunk. Returns false for
    /// unknown ids.
    pub fn cancel(&self, id: Uuid) -> bool {
        let registry = self.registry.read().unwrap();
        match registry.get(&id) {
            Some(record) => {
                record.cancel.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }
}

async fn run_worker(indexer: Arc<Indexer>, mut rx: mpsc::Receiver<Uuid>, registry: Registry) {
    while let Some(id) = rx.recv().await {
        let (video, cancel) = {
            let registry = registry.read().unwrap();
            let Some(record) = registry.get(&id) else {
                warn!("Dropping unknown job {id}");
                continue;
            };
            (record.status.video.clone(), record.cancel.clone())
        };

        if cancel.load(Ordering::SeqCst) {
            update_status(&registry, id, |status| status.state = JobState::Cancelled);
            continue;
        }

        update_status(&registry, id, |status| status.state = JobState::Running);
        info!("Indexing job {id}: {}", video.display());

        let progress_registry = registry.clone();
        let progress_cancel = cancel.clone();
        let result = indexer
            .index_video_with_progress(&video, move |done, total| {
                update_status(&progress_registry, id, |status| {
                    status.chunks_done = done;
                    status.total_chunks = total;
                });
                !progress_cancel.load(Ordering::SeqCst)
            })
            .await;

        match result {
            Ok(report) if report.cancelled => {
                info!("Job {id} cancelled after {} chunks", report.chunks_indexed);
                update_status(&registry, id, |status| status.state = JobState::Cancelled);
            }
            Ok(report) => {
                info!("Job {id} completed: {} chunks", report.chunks_indexed);
                update_status(&registry, id, |status| status.state = JobState::Completed);
            }
            Err(e) => {
                error!("Job {id} failed: {e}");
                update_status(&registry, id, |status| {
                    status.state = JobState::Failed {
                        error: e.to_string(),
                    }
                });
            }
        }
    }
}

fn update_status(registry: &Registry, id: Uuid, f: impl FnOnce(&mut JobStatus)) {
    if let Some(record) = registry.write().unwrap().get_mut(&id) {
        f(&mut record.status);
        record.status.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captioning::Captioner;
    use crate::chunking::TimelineChunker;
    use crate::embedding::{Embedder, VisualEmbedder};
    use crate::extraction::{Extraction, KnowledgeExtractor};
    use crate::graph_store::KnowledgeGraphStore;
    use crate::media::MediaSource;
    use crate::transcription::Transcriber;
    use crate::vector_store::{ChunkCatalog, VectorIndex};
    use async_trait::async_trait;
    use std::path::Path;

    struct FakeMedia {
        duration: f64,
    }

    #[async_trait]
    impl MediaSource for FakeMedia {
        async fn duration(&self, _video: &Path) -> Result<f64> {
            Ok(self.duration)
        }

        async fn extract_audio(
            &self,
            _video: &Path,
            _start: f64,
            _end: f64,
            dest: &Path,
        ) -> Result<()> {
            std::fs::write(dest, b"audio")?;
            Ok(())
        }

        async fn extract_frame(&self, _video: &Path, _at: f64, dest: &Path) -> Result<()> {
            std::fs::write(dest, b"frame")?;
            Ok(())
        }
    }

    struct BrokenMedia;

    #[async_trait]
    impl MediaSource for BrokenMedia {
        async fn duration(&self, _video: &Path) -> Result<f64> {
            Err(BlikkError::Media("no such file".to_string()))
        }

        async fn extract_audio(
            &self,
            _video: &Path,
            _start: f64,
            _end: f64,
            _dest: &Path,
        ) -> Result<()> {
            unreachable!()
        }

        async fn extract_frame(&self, _video: &Path, _at: f64, _dest: &Path) -> Result<()> {
            unreachable!()
        }
    }

    struct FakeTranscriber;

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
            Ok("words".to_string())
        }
    }

    struct FakeCaptioner;

    #[async_trait]
    impl Captioner for FakeCaptioner {
        async fn caption(&self, _image_path: &Path) -> Result<String> {
            Ok("a scene".to_string())
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
            Ok(vec![0.0, 1.0])
        }

        async fn embed_text(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0, 1.0])
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    struct NoopExtractor;

    #[async_trait]
    impl KnowledgeExtractor for NoopExtractor {
        async fn extract(&self, _text: &str) -> Result<Extraction> {
            Ok(Extraction::default())
        }
    }

    fn test_indexer(media: Arc<dyn MediaSource>, temp_dir: PathBuf) -> Arc<Indexer> {
        Arc::new(Indexer::with_components(
            TimelineChunker::new(30),
            media,
            Arc::new(FakeTranscriber),
            Arc::new(FakeCaptioner),
            Arc::new(FakeEmbedder),
            Arc::new(FakeVisualEmbedder),
            Arc::new(NoopExtractor),
            Arc::new(RwLock::new(VectorIndex::in_memory(2))),
            Arc::new(RwLock::new(VectorIndex::in_memory(2))),
            Arc::new(RwLock::new(KnowledgeGraphStore::in_memory())),
            Arc::new(RwLock::new(ChunkCatalog::in_memory())),
            temp_dir,
        ))
    }

    async fn wait_for_terminal(queue: &JobQueue, id: Uuid) -> JobStatus {
        for _ in 0..200 {
            if let Some(status) = queue.status(id) {
                match status.state {
                    JobState::Queued | JobState::Running => {}
                    _ => return status,
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("job never reached a terminal state");
    }

    #[tokio::test]
    async fn test_job_runs_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = test_indexer(Arc::new(FakeMedia { duration: 65.0 }), dir.path().into());
        let queue = JobQueue::start(indexer);

        let id = queue.submit(PathBuf::from("lecture.mp4")).await.unwrap();
        let status = wait_for_terminal(&queue, id).await;

        assert_eq!(status.state, JobState::Completed);
        assert_eq!(status.chunks_done, 3);
        assert_eq!(status.total_chunks, 3);
    }

    #[tokio::test]
    async fn test_failed_job_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = test_indexer(Arc::new(BrokenMedia), dir.path().into());
        let queue = JobQueue::start(indexer);

        let id = queue.submit(PathBuf::from("missing.mp4")).await.unwrap();
        let status = wait_for_terminal(&queue, id).await;

        match status.state {
            JobState::Failed { error } => assert!(error.contains("no such file")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_before_worker_picks_up() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = test_indexer(Arc::new(FakeMedia { duration: 65.0 }), dir.path().into());
        let queue = JobQueue::start(indexer);

        // Two submissions: the second is cancelled while the first occupies
        // the single worker.
        let first = queue.submit(PathBuf::from("a.mp4")).await.unwrap();
        let second = queue.submit(PathBuf::from("b.mp4")).await.unwrap();
        assert!(queue.cancel(second));

        wait_for_terminal(&queue, first).await;
        let status = wait_for_terminal(&queue, second).await;
        assert_eq!(status.state, JobState::Cancelled);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = test_indexer(Arc::new(FakeMedia { duration: 10.0 }), dir.path().into());
        let queue = JobQueue::start(indexer);

        assert!(queue.status(Uuid::new_v4()).is_none());
        assert!(!queue.cancel(Uuid::new_v4()));
    }
}
