//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::vector_store::VectorIndex;
use anyhow::Result;

/// Run the search command: raw similarity search over the textual index.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let index = VectorIndex::open(
        &settings.text_index_path(),
        settings.embedding.text_dimensions as usize,
    )?;

    if index.is_empty() {
        Output::warning("No indexed segments yet. Run 'blikk index <file>' first.");
        return Ok(());
    }

    let embedder = OpenAIEmbedder::with_config(
        &settings.embedding.text_model,
        settings.embedding.text_dimensions as usize,
    );

    let spinner = Output::spinner("Searching...");
    let vector = embedder.embed(query).await?;
    spinner.finish_and_clear();

    let hits = index.query(&vector, limit);

    if hits.is_empty() {
        Output::info("No results.");
        return Ok(());
    }

    Output::header(&format!("Results for \"{}\"", query));
    for hit in &hits {
        Output::segment(
            hit.metadata.start,
            hit.metadata.end,
            &hit.metadata.text,
            Some(hit.score),
        );
    }

    Ok(())
}
