use crate::llm::{GenerationOptions, GroundedSearchClient};
use crate::research::fallback;
use crate::research::prompts::{current_date, web_searcher_prompt};
use crate::research::sources::{collect_sources, get_citations, insert_citation_markers, resolve_urls};
use crate::research::state::{ResearchTask, WorkerOutput};
use crate::types::AppError;
use std::sync::Arc;

const NO_RESULTS: &str = "No search results available.";

/// Runs one grounded search query
///
/// Cheap to clone; each fanned-out task gets its own copy sharing the
/// underlying search client.
#[derive(Clone)]
pub struct ResearchWorker {
    search: Arc<dyn GroundedSearchClient>,
    run_id: String,
}

impl ResearchWorker {
    pub fn new(search: Arc<dyn GroundedSearchClient>, run_id: impl Into<String>) -> Self {
        Self {
            search,
            run_id: run_id.into(),
        }
    }

    /// Execute `task`. Every failure path yields a degraded output instead of an error.
    pub async fn research(&self, task: ResearchTask) -> WorkerOutput {
        let query = task.query_text;
        tracing::info!("Starting web research for query: {}", query);

        let prompt = web_searcher_prompt(&query, &current_date());
        let response = match self
            .search
            .search(&prompt, GenerationOptions::deterministic())
            .await
        {
            Ok(response) => response,
            Err(e) => return fallback::degrade(&e, &query),
        };

        let Some(candidate) = response.candidates.into_iter().next() else {
            tracing::warn!("Empty response received for query: {}", query);
            return fallback::degrade(
                &AppError::Internal("Empty response from search service".to_string()),
                &query,
            );
        };

        let Some(metadata) = candidate.grounding else {
            tracing::warn!("No grounding metadata in response for query: {}", query);
            let result_text = if candidate.text.trim().is_empty() {
                NO_RESULTS.to_string()
            } else {
                candidate.text
            };
            return WorkerOutput {
                query,
                result_text,
                citations: Vec::new(),
            };
        };

        let resolved = resolve_urls(&metadata.chunks, &self.run_id, task.sequence_id);
        let citations = get_citations(&metadata, &resolved);
        let result_text = insert_citation_markers(&candidate.text, &citations);
        let sources = collect_sources(&citations);

        tracing::info!(
            "Completed web research for query: {} ({} sources)",
            query,
            sources.len()
        );

        WorkerOutput {
            query,
            result_text,
            citations: sources,
        }
    }
}
