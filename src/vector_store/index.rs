//! JSON-document-backed nearest-neighbor index.

use super::{cosine_similarity, RecordMetadata, ScoredRecord, VectorRecord};
use crate::error::{BlikkError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk document layout for one index.
#[derive(Serialize, Deserialize)]
struct IndexDocument {
    dimension: usize,
    records: Vec<VectorRecord>,
}

/// A single-file vector index with a fixed dimension.
///
/// Records are kept in insertion order; re-upserting an id replaces the
/// existing record in place, so query tie-breaking stays deterministic.
pub struct VectorIndex {
    path: Option<PathBuf>,
    dimension: usize,
    records: Vec<VectorRecord>,
}

impl VectorIndex {
    /// Open an index backed by the given document, loading existing records.
    ///
    /// A missing document starts an empty index. A document whose stored
    /// dimension disagrees with `dimension` is a configuration error.
    pub fn open(path: &Path, dimension: usize) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                path: Some(path.to_path_buf()),
                dimension,
                records: Vec::new(),
            });
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| BlikkError::Storage(format!("reading {}: {e}", path.display())))?;
        let doc: IndexDocument = serde_json::from_str(&content)
            .map_err(|e| BlikkError::Storage(format!("parsing {}: {e}", path.display())))?;

        if doc.dimension != dimension {
            return Err(BlikkError::Config(format!(
                "index {} holds {}-dimensional vectors, configured for {}",
                path.display(),
                doc.dimension,
                dimension
            )));
        }

        debug!("Loaded {} records from {}", doc.records.len(), path.display());

        Ok(Self {
            path: Some(path.to_path_buf()),
            dimension,
            records: doc.records,
        })
    }

    /// Create an index with no backing document (used in tests).
    pub fn in_memory(dimension: usize) -> Self {
        Self {
            path: None,
            dimension,
            records: Vec::new(),
        }
    }

    /// The configured vector dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert or replace records, then persist the whole document.
    ///
    /// Every vector is dimension-checked before any record is applied, so a
    /// failed batch leaves the index untouched. Replacement is keyed by id
    /// and keeps the record's original position.
    pub fn upsert(&mut self, records: Vec<VectorRecord>) -> Result<()> {
        for record in &records {
            if record.vector.len() != self.dimension {
                return Err(BlikkError::DimensionMismatch {
                    expected: self.dimension,
                    got: record.vector.len(),
                });
            }
        }

        for record in records {
            match self.records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => self.records.push(record),
            }
        }

        self.save()
    }

    /// Return up to `top_k` records ordered by descending cosine similarity.
    ///
    /// Ties keep insertion order. An empty index returns an empty vec.
    pub fn query(&self, vector: &[f32], top_k: usize) -> Vec<ScoredRecord> {
        let mut hits: Vec<ScoredRecord> = self
            .records
            .iter()
            .map(|r| ScoredRecord {
                id: r.id,
                metadata: r.metadata.clone(),
                score: cosine_similarity(vector, &r.vector),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        hits
    }

    /// Look up one record's metadata by chunk id.
    pub fn get(&self, id: &uuid::Uuid) -> Option<&RecordMetadata> {
        self.records.iter().find(|r| r.id == *id).map(|r| &r.metadata)
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| BlikkError::Storage(format!("creating {}: {e}", parent.display())))?;
        }

        let doc = IndexDocument {
            dimension: self.dimension,
            records: self.records.clone(),
        };
        let content = serde_json::to_string(&doc)?;
        std::fs::write(path, content)
            .map_err(|e| BlikkError::Storage(format!("writing {}: {e}", path.display())))?;

        Ok(())
    }
}
