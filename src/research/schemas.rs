//! Structured-output contracts for the generation service.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Planner output
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchQueryList {
    /// Search queries to run
    pub query: Vec<String>,
    /// Why these queries are relevant to the topic
    #[serde(default)]
    pub rationale: String,
}

/// Reflection output
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Reflection {
    /// Whether the summaries are enough to answer the question
    pub is_sufficient: bool,
    /// What is missing or needs clarification
    #[serde(default)]
    pub knowledge_gap: String,
    /// Queries that would close the gap
    #[serde(default)]
    pub follow_up_queries: Vec<String>,
}
