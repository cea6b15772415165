use crate::llm::{GenerationOptions, LLMClient};
use crate::research::fallback::ErrorClass;
use crate::research::prompts::{answer_prompt, current_date};
use crate::types::{AppError, SourceCitation};
use serde::Serialize;
use std::sync::Arc;

/// Separator between accumulated results in the answer prompt
const SUMMARY_SEPARATOR: &str = "\n---\n\n";

/// The answer delivered to the user
#[derive(Debug, Clone, Serialize)]
pub struct FinalAnswer {
    pub answer_text: String,
    /// Sources whose handle appeared in the answer
    pub cited_sources: Vec<SourceCitation>,
}

/// Writes the final cited answer
pub struct AnswerFinalizer {
    llm: Arc<dyn LLMClient>,
}

impl AnswerFinalizer {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    pub async fn finalize(
        &self,
        topic: &str,
        results: &[String],
        sources: &[SourceCitation],
    ) -> FinalAnswer {
        tracing::info!("Finalizing research answer");

        let prompt = answer_prompt(topic, &results.join(SUMMARY_SEPARATOR), &current_date());
        match self
            .llm
            .generate(&prompt, GenerationOptions::deterministic())
            .await
        {
            Ok(text) => {
                let answer = resolve_citations(text, sources);
                tracing::info!(
                    "Finalized answer citing {} of {} sources",
                    answer.cited_sources.len(),
                    sources.len()
                );
                answer
            }
            Err(e) => {
                tracing::error!("Error during answer finalization: {}", e);
                FinalAnswer {
                    answer_text: fallback_report(&e, results),
                    cited_sources: sources.to_vec(),
                }
            }
        }
    }
}

/// Swap short handles for their original values and keep only cited sources.
///
/// One left-to-right pass over `sources`; each replacement happens before
/// the next source is checked.
pub fn resolve_citations(mut text: String, sources: &[SourceCitation]) -> FinalAnswer {
    let mut cited_sources = Vec::new();
    for source in sources {
        if text.contains(&source.short_handle) {
            text = text.replace(&source.short_handle, &source.original_value);
            cited_sources.push(source.clone());
        }
    }

    FinalAnswer {
        answer_text: text,
        cited_sources,
    }
}

/// Report built from the raw results when synthesis fails
pub fn fallback_report(error: &AppError, results: &[String]) -> String {
    let note = match ErrorClass::of(error) {
        ErrorClass::Quota => "Unable to generate final summary due to API quota exhaustion.".to_string(),
        ErrorClass::Service => format!("Unable to generate final summary due to an API error: {}", error),
        ErrorClass::Unexpected => "Unable to generate final summary due to an unexpected error.".to_string(),
    };

    let mut report = String::from("# Research Summary\n\n");
    report.push_str(&format!("⚠️ **Note**: {}\n\n", note));
    report.push_str("## Available Research Results:\n\n");
    for (i, result) in results.iter().enumerate() {
        report.push_str(&format!("### Research Result {}\n{}\n\n", i + 1, result));
    }
    report
}
