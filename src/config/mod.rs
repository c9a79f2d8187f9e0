//! Configuration module for Blikk.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, ModelSettings, RetrievalSettings,
    ServerSettings, Settings,
};
