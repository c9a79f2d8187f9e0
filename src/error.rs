//! Error types for Blikk.

use thiserror::Error;

/// Library-level error type for Blikk operations.
#[derive(Error, Debug)]
pub enum BlikkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Captioning failed: {0}")]
    Captioning(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Knowledge extraction failed: {0}")]
    Extraction(String),

    #[error("Query planning failed: {0}")]
    Planning(String),

    #[error("Answer synthesis failed: {0}")]
    Synthesis(String),

    #[error("Vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Knowledge graph error: {0}")]
    Graph(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Blikk operations.
pub type Result<T> = std::result::Result<T, BlikkError>;
