//! Frame captioning collaborator.

mod openai;

pub use openai::OpenAICaptioner;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for visual captioning implementations.
#[async_trait]
pub trait Captioner: Send + Sync {
    /// Generate a detailed natural-language description of a frame image.
    async fn caption(&self, image_path: &Path) -> Result<String>;
}
