//! Degraded results for failed research calls.
//!
//! A failed search must not fail its batch, so every error is turned into a
//! readable placeholder result that is never cited.

use crate::research::state::WorkerOutput;
use crate::types::AppError;

/// How a failure from an external call is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rate or budget exhausted; expected to clear on its own
    Quota,
    /// The external service reported a failure
    Service,
    /// Anything else, including malformed or empty responses
    Unexpected,
}

impl ErrorClass {
    pub fn of(error: &AppError) -> Self {
        match error {
            AppError::Quota(_) => ErrorClass::Quota,
            AppError::LLM(_) => ErrorClass::Service,
            _ => ErrorClass::Unexpected,
        }
    }
}

/// Convert a failed search for `query` into a degraded, uncited result.
pub fn degrade(error: &AppError, query: &str) -> WorkerOutput {
    let result_text = match ErrorClass::of(error) {
        ErrorClass::Quota => {
            tracing::warn!("Search quota exhausted for query: {}", query);
            format!(
                "⚠️ **API Quota Exhausted**\n\n\
                 The search API quota was exceeded while researching: '{}'\n\n\
                 **What this means:**\n\
                 - The research system has reached its API usage limit\n\
                 - This is a temporary limitation that resets automatically\n\
                 - The research will continue with available information from other queries\n\n\
                 **Recommendations:**\n\
                 - Try again later when the quota resets\n\
                 - Consider using fewer search queries or reducing research depth",
                query
            )
        }
        ErrorClass::Service => {
            tracing::error!("Search API error for query '{}': {}", query, error);
            format!(
                "⚠️ **Search API Error**\n\n\
                 An error occurred while searching for: '{}'\n\n\
                 Error details: {}\n\n\
                 The research will continue with available information from other queries.",
                query,
                service_detail(error)
            )
        }
        ErrorClass::Unexpected => {
            tracing::error!(
                "Unexpected error during web research for query '{}': {}",
                query,
                error
            );
            format!(
                "⚠️ **Research Error**\n\n\
                 An unexpected error occurred while researching: '{}'\n\n\
                 The research will continue with available information from other queries.",
                query
            )
        }
    };

    WorkerOutput {
        query: query.to_string(),
        result_text,
        citations: Vec::new(),
    }
}

fn service_detail(error: &AppError) -> String {
    match error {
        AppError::LLM(detail) => detail.clone(),
        other => other.to_string(),
    }
}
