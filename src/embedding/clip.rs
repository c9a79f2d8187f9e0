//! Visual embeddings via a local CLIP-style HTTP service.
//!
//! The service exposes `/embed/image` (base64 payload) and `/embed/text`,
//! both returning `{ "embedding": [...] }`.

use super::VisualEmbedder;
use crate::error::{BlikkError, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

#[derive(Serialize)]
struct ImageRequest {
    model: String,
    image: String,
}

#[derive(Serialize)]
struct TextRequest {
    model: String,
    text: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// CLIP-service-backed visual embedder.
pub struct ClipEmbedder {
    base_url: String,
    model: String,
    dimensions: usize,
    client: reqwest::Client,
}

impl ClipEmbedder {
    /// Create an embedder against the given service endpoint.
    pub fn new(base_url: &str, model: &str, dimensions: usize) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
            client: reqwest::Client::new(),
        }
    }

    async fn post_embedding<T: Serialize>(&self, route: &str, request: &T) -> Result<Vec<f32>> {
        let url = format!("{}{}", self.base_url, route);

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(BlikkError::Embedding(format!(
                "Visual embedding request failed: {}",
                response.status()
            )));
        }

        let body: EmbeddingResponse = response.json().await?;

        if body.embedding.len() != self.dimensions {
            return Err(BlikkError::DimensionMismatch {
                expected: self.dimensions,
                got: body.embedding.len(),
            });
        }

        Ok(body.embedding)
    }
}

#[async_trait]
impl VisualEmbedder for ClipEmbedder {
    #[instrument(skip(self), fields(image = %image_path.display()))]
    async fn embed_image(&self, image_path: &Path) -> Result<Vec<f32>> {
        let bytes = std::fs::read(image_path)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

        debug!("Embedding frame ({} bytes encoded)", encoded.len());

        self.post_embedding(
            "/embed/image",
            &ImageRequest {
                model: self.model.clone(),
                image: encoded,
            },
        )
        .await
    }

    #[instrument(skip(self, text))]
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        self.post_embedding(
            "/embed/text",
            &TextRequest {
                model: self.model.clone(),
                text: text.to_string(),
            },
        )
        .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
