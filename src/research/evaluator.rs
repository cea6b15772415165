use crate::llm::{generate_typed, GenerationOptions, LLMClient};
use crate::research::fallback::ErrorClass;
use crate::research::prompts::{current_date, reflection_prompt};
use crate::research::schemas::Reflection;
use std::sync::Arc;

/// Separator between accumulated results in the reflection prompt
const SUMMARY_SEPARATOR: &str = "\n\n---\n\n";

/// Verdict on the evidence gathered so far
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub sufficient: bool,
    pub knowledge_gap: String,
    pub follow_up_queries: Vec<String>,
}

impl Evaluation {
    /// Stop researching after a failed evaluation.
    ///
    /// Errors always resolve toward termination; resolving toward another
    /// round could loop without bound.
    fn fail_safe(knowledge_gap: String) -> Self {
        Self {
            sufficient: true,
            knowledge_gap,
            follow_up_queries: Vec::new(),
        }
    }
}

/// Judges whether accumulated research answers the topic
pub struct SufficiencyEvaluator {
    llm: Arc<dyn LLMClient>,
}

impl SufficiencyEvaluator {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    pub async fn evaluate(&self, topic: &str, results: &[String]) -> Evaluation {
        let prompt = reflection_prompt(topic, &results.join(SUMMARY_SEPARATOR), &current_date());

        match generate_typed::<Reflection>(self.llm.as_ref(), &prompt, GenerationOptions::creative())
            .await
        {
            Ok(reflection) => {
                let follow_up_queries: Vec<String> = reflection
                    .follow_up_queries
                    .into_iter()
                    .map(|q| q.trim().to_string())
                    .filter(|q| !q.is_empty())
                    .collect();
                tracing::info!(
                    "Reflection completed - sufficient: {}, follow-ups: {}",
                    reflection.is_sufficient,
                    follow_up_queries.len()
                );
                Evaluation {
                    sufficient: reflection.is_sufficient,
                    knowledge_gap: reflection.knowledge_gap,
                    follow_up_queries,
                }
            }
            Err(e) => match ErrorClass::of(&e) {
                ErrorClass::Quota | ErrorClass::Service => {
                    tracing::error!("API error during reflection: {}", e);
                    Evaluation::fail_safe(format!(
                        "Unable to perform reflection due to API error: {}",
                        e
                    ))
                }
                ErrorClass::Unexpected => {
                    tracing::error!("Unexpected error during reflection: {}", e);
                    Evaluation::fail_safe(
                        "Unable to perform reflection due to an unexpected error".to_string(),
                    )
                }
            },
        }
    }
}
