//! Embedding generation for both retrieval channels.

mod clip;
mod openai;

pub use clip::ClipEmbedder;
pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for textual embedding generation (dimension Dt).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Trait for visual-space embedding generation (dimension Dv).
///
/// Both towers of the same model: frames are embedded during indexing,
/// scene descriptions during retrieval, into the same space.
#[async_trait]
pub trait VisualEmbedder: Send + Sync {
    /// Embed a frame image into visual space.
    async fn embed_image(&self, image_path: &Path) -> Result<Vec<f32>>;

    /// Embed a scene description into visual space.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}
