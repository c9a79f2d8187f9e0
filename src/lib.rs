//! Blikk - Multi-Modal Video Knowledge Base
//!
//! A local-first tool for indexing a long-form video into a searchable,
//! timestamp-grounded knowledge base.
//!
//! The name "Blikk" comes from the Norwegian word for "glance."
//!
//! # Overview
//!
//! Blikk allows you to:
//! - Split a video into fixed-length time chunks and derive three parallel
//!   representations per chunk: a visual embedding, a textual embedding, and
//!   extracted entities/relations
//! - Persist those representations in a dual vector index and a knowledge graph
//! - Ask natural-language questions and get answers cited with `[start-end]`
//!   timestamps
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `chunking` - Timeline segmentation into fixed windows
//! - `media` - Audio/frame extraction collaborators (ffmpeg/ffprobe)
//! - `transcription` - Speech-to-text collaborator
//! - `captioning` - Frame captioning collaborator
//! - `embedding` - Text and visual embedding collaborators
//! - `extraction` - Entity/relation extraction collaborator
//! - `vector_store` - Dual vector index and chunk catalog
//! - `graph_store` - Knowledge graph store
//! - `planner` - Query decomposition
//! - `retrieval` - Fusion retrieval across all three representations
//! - `synthesis` - Cited answer generation
//! - `indexer` - Per-chunk indexing pipeline
//! - `jobs` - Background indexing job queue
//!
//! # Example
//!
//! ```rust,no_run
//! use blikk::config::Settings;
//! use blikk::indexer::Indexer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let indexer = Indexer::new(&settings)?;
//!
//!     let result = indexer.index_video(std::path::Path::new("lecture.mp4")).await?;
//!     println!("Indexed {} chunks", result.chunks_indexed);
//!
//!     Ok(())
//! }
//! ```

pub mod captioning;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod graph_store;
pub mod indexer;
pub mod jobs;
pub mod media;
pub mod openai;
pub mod planner;
pub mod retrieval;
pub mod synthesis;
pub mod transcription;
pub mod vector_store;

pub use error::{BlikkError, Result};
