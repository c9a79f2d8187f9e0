//! Graph-stats command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::graph_store::KnowledgeGraphStore;
use anyhow::Result;

/// Show knowledge graph statistics.
pub fn run_graph_stats(settings: Settings) -> Result<()> {
    let graph = KnowledgeGraphStore::open(&settings.knowledge_graph_path())?;
    let stats = graph.stats();

    Output::header("Knowledge Graph");
    Output::kv("Entities", &stats.node_count.to_string());
    Output::kv("Relations", &stats.edge_count.to_string());
    Output::kv(
        "Document",
        &settings.knowledge_graph_path().display().to_string(),
    );

    if stats.node_count == 0 {
        println!();
        Output::info("The graph is empty. Run 'blikk index <file>' to populate it.");
    }

    Ok(())
}
