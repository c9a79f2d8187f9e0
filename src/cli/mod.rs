//! CLI module for Blikk.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Blikk - Multi-Modal Video Knowledge Base
///
/// Index videos into a searchable, timestamp-cited knowledge base built from
/// what is said and what is shown. The name "Blikk" comes from the
/// Norwegian/Scandinavian word for "glance."
#[derive(Parser, Debug)]
#[command(name = "blikk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Blikk and verify system requirements
    Init,

    /// Index a local video file into the knowledge base
    Index {
        /// Path to the video file
        file: String,
    },

    /// Ask a question about the indexed videos
    Ask {
        /// The question to ask
        question: String,
    },

    /// Search indexed segments by transcript/scene similarity
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show knowledge graph statistics
    GraphStats,

    /// Start the HTTP API server (upload, jobs, chat)
    Serve {
        /// Host to bind to (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },
}
