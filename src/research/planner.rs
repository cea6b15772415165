use crate::llm::{generate_typed, GenerationOptions, LLMClient};
use crate::research::prompts::{current_date, query_writer_prompt};
use crate::research::schemas::SearchQueryList;
use crate::types::Result;
use std::sync::Arc;

/// Longest fallback query, in characters
const FALLBACK_QUERY_CHARS: usize = 100;

/// Used when the topic itself is blank
const EMPTY_TOPIC_QUERY: &str = "general overview";

/// Writes the first batch of search queries for a topic
pub struct QueryPlanner {
    llm: Arc<dyn LLMClient>,
}

impl QueryPlanner {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    /// Plan up to `desired_count` queries for `topic`.
    ///
    /// Never returns an empty list: any failure falls back to a single query
    /// derived from the topic.
    pub async fn plan_initial(&self, topic: &str, desired_count: usize) -> Vec<String> {
        let desired_count = desired_count.max(1);
        tracing::info!(
            "Generating {} search queries for topic: {}",
            desired_count,
            truncate_chars(topic, FALLBACK_QUERY_CHARS)
        );

        match self.request_queries(topic, desired_count).await {
            Ok(queries) if !queries.is_empty() => {
                tracing::info!("Generated {} search queries", queries.len());
                queries
            }
            Ok(_) => {
                tracing::warn!("Query generation returned no usable queries");
                vec![fallback_query(topic)]
            }
            Err(e) => {
                tracing::error!("Query generation failed: {}", e);
                let fallback = fallback_query(topic);
                tracing::info!("Using fallback query: {}", fallback);
                vec![fallback]
            }
        }
    }

    async fn request_queries(&self, topic: &str, desired_count: usize) -> Result<Vec<String>> {
        let prompt = query_writer_prompt(topic, desired_count, &current_date());
        let list: SearchQueryList =
            generate_typed(self.llm.as_ref(), &prompt, GenerationOptions::creative()).await?;

        Ok(list
            .query
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .take(desired_count)
            .collect())
    }
}

/// A single query built from the topic itself
pub fn fallback_query(topic: &str) -> String {
    let trimmed = topic.trim();
    if trimmed.is_empty() {
        EMPTY_TOPIC_QUERY.to_string()
    } else {
        truncate_chars(trimmed, FALLBACK_QUERY_CHARS)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
