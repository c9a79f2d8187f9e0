//! Configuration settings for Blikk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub models: ModelSettings,
    pub retrieval: RetrievalSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory holding all durable state (indices, graph, uploads).
    pub storage_root: String,
    /// Directory for temporary audio/frame files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            storage_root: "~/.blikk".to_string(),
            temp_dir: "/tmp/blikk".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Timeline chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Fixed chunk window length in seconds.
    pub window_seconds: u32,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { window_seconds: 30 }
    }
}

/// Embedding generation settings for both channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Textual embedding model.
    pub text_model: String,
    /// Textual embedding dimensions (Dt).
    pub text_dimensions: u32,
    /// Base URL of the visual embedding (CLIP) service.
    pub visual_endpoint: String,
    /// Visual embedding model.
    pub visual_model: String,
    /// Visual embedding dimensions (Dv).
    pub visual_dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            text_model: "text-embedding-3-small".to_string(),
            text_dimensions: 1536,
            visual_endpoint: "http://localhost:8400".to_string(),
            visual_model: "ViT-B-32".to_string(),
            visual_dimensions: 512,
        }
    }
}

/// Model identifiers for the external LLM collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Speech-to-text model.
    pub transcription: String,
    /// Vision model for frame captioning.
    pub caption: String,
    /// Model for query decomposition.
    pub planner: String,
    /// Model for entity/relation extraction.
    pub extraction: String,
    /// Model for answer synthesis.
    pub synthesis: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            transcription: "whisper-1".to_string(),
            caption: "gpt-4o-mini".to_string(),
            planner: "gpt-4o-mini".to_string(),
            extraction: "gpt-4o-mini".to_string(),
            synthesis: "gpt-4o-mini".to_string(),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of nearest neighbors fetched per vector channel.
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::BlikkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("blikk")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded storage root path.
    pub fn storage_root(&self) -> PathBuf {
        Self::expand_path(&self.general.storage_root)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Path of the visual vector index document.
    pub fn visual_index_path(&self) -> PathBuf {
        self.storage_root().join("visual_index.json")
    }

    /// Path of the textual vector index document.
    pub fn text_index_path(&self) -> PathBuf {
        self.storage_root().join("text_index.json")
    }

    /// Path of the chunk catalog document.
    pub fn chunk_catalog_path(&self) -> PathBuf {
        self.storage_root().join("chunk_catalog.json")
    }

    /// Path of the knowledge graph document.
    pub fn knowledge_graph_path(&self) -> PathBuf {
        self.storage_root().join("knowledge_graph.json")
    }

    /// Directory where uploaded videos are stored.
    pub fn uploads_dir(&self) -> PathBuf {
        self.storage_root().join("uploads")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.window_seconds, 30);
        assert_eq!(settings.embedding.text_dimensions, 1536);
        assert_eq!(settings.embedding.visual_dimensions, 512);
        assert_eq!(settings.retrieval.top_k, 3);
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.chunking.window_seconds = 60;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.chunking.window_seconds, 60);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let loaded = Settings::load_from(Some(&PathBuf::from("/nonexistent/blikk.toml"))).unwrap();
        assert_eq!(loaded.chunking.window_seconds, 30);
    }
}
