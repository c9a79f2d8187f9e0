//! Dual vector index for Blikk.
//!
//! Two logically identical [`VectorIndex`] instances hold the visual and
//! textual embeddings, differing only by configured dimension. Each index
//! owns a single JSON document and rewrites it synchronously on every upsert
//! (durability over throughput; indexing is not latency-sensitive).

mod catalog;
mod index;

pub use catalog::ChunkCatalog;
pub use index::VectorIndex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata carried with every vector record.
///
/// Decoded strictly: retrieval never handles loose JSON payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordMetadata {
    /// Combined chunk text (transcript + visual scene, time-tagged).
    pub text: String,
    /// Chunk start time in seconds.
    pub start: f64,
    /// Chunk end time in seconds.
    pub end: f64,
}

/// An (id, vector, metadata) triple stored in one index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Chunk id this record belongs to. At most one record per id per index.
    pub id: Uuid,
    /// Embedding vector; length must match the index dimension.
    pub vector: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// A query hit with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub id: Uuid,
    pub metadata: RecordMetadata,
    /// Cosine similarity to the query vector (higher is better).
    pub score: f32,
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
