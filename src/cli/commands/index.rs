//! Index command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::indexer::Indexer;
use anyhow::Result;
use std::path::Path;

/// Run the index command.
pub async fn run_index(file: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Index) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let path = Path::new(file);
    if !path.exists() {
        Output::error(&format!("File not found: {}", file));
        anyhow::bail!("File not found: {}", file);
    }

    let indexer = Indexer::new(&settings)?;

    Output::info(&format!("Indexing {}", path.display()));
    let pb = Output::progress_bar(0, "Processing chunks...");

    let report = indexer
        .index_video_with_progress(path, |done, total| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
            true
        })
        .await;

    match report {
        Ok(report) => {
            pb.finish_and_clear();
            Output::success(&format!(
                "Indexed {} chunks from {:.1}s of video",
                report.chunks_indexed, report.duration_seconds
            ));
            Ok(())
        }
        Err(e) => {
            pb.finish_and_clear();
            Output::error(&format!("Indexing failed: {}", e));
            Err(e.into())
        }
    }
}
