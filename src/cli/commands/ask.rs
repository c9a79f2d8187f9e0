//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::indexer::Indexer;
use crate::planner::LlmQueryPlanner;
use crate::retrieval::FusionRetriever;
use crate::synthesis::{AnswerEngine, OpenAISynthesizer};
use anyhow::Result;
use std::sync::Arc;

/// Run the ask command.
pub async fn run_ask(question: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let indexer = Indexer::new(&settings)?;
    let engine = build_engine(&indexer, &settings);

    let spinner = Output::spinner("Searching the video knowledge base...");

    match engine.ask(question).await {
        Ok(answer) => {
            spinner.finish_and_clear();

            println!("\n{}\n", answer.answer);

            if !answer.sources.is_empty() {
                Output::header("Sources");
                for source in &answer.sources {
                    Output::segment(source.start, source.end, &source.text, None);
                }
            }
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            Err(e.into())
        }
    }
}

/// Wire the question-answering pipeline from an indexer's shared stores.
pub fn build_engine(indexer: &Indexer, settings: &Settings) -> AnswerEngine {
    let retriever = FusionRetriever::new(
        indexer.visual_index(),
        indexer.text_index(),
        indexer.graph(),
        indexer.catalog(),
        indexer.text_embedder(),
        indexer.visual_embedder(),
        settings.retrieval.top_k,
    );

    AnswerEngine::new(
        Arc::new(LlmQueryPlanner::new(&settings.models.planner)),
        retriever,
        Arc::new(OpenAISynthesizer::new(&settings.models.synthesis)),
    )
}
