//! LLM client abstractions
//!
//! Two collaborators sit behind traits so the research loop never depends on
//! a concrete provider:
//! - [`LLMClient`]: free-text and schema-constrained generation
//! - [`GroundedSearchClient`]: search-augmented generation with grounding metadata

use crate::types::{AppError, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Sampling parameters for a single generation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
}

impl GenerationOptions {
    /// Temperature 0, used for search and answer synthesis
    pub fn deterministic() -> Self {
        Self { temperature: 0.0 }
    }

    /// Temperature 1, used for query writing and reflection
    pub fn creative() -> Self {
        Self { temperature: 1.0 }
    }
}

/// Generic LLM client trait for provider abstraction
///
/// Implementations must be safe to share across concurrently running
/// research workers.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a free-text completion from a prompt
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String>;

    /// Generate a JSON value constrained by `schema`
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        options: GenerationOptions,
    ) -> Result<serde_json::Value>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Search-augmented generation
#[async_trait]
pub trait GroundedSearchClient: Send + Sync {
    /// Generate an answer with live search enabled
    async fn search(&self, prompt: &str, options: GenerationOptions) -> Result<GroundedResponse>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Response from a grounded search request
#[derive(Debug, Clone, Default)]
pub struct GroundedResponse {
    /// Generated candidates; an empty list means the service returned nothing usable
    pub candidates: Vec<GroundedCandidate>,
}

#[derive(Debug, Clone, Default)]
pub struct GroundedCandidate {
    pub text: String,
    pub grounding: Option<GroundingMetadata>,
}

/// Attribution data linking spans of the generated text to web sources
#[derive(Debug, Clone, Default)]
pub struct GroundingMetadata {
    pub chunks: Vec<GroundingChunk>,
    pub supports: Vec<GroundingSupport>,
}

/// A retrieved web reference
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundingChunk {
    pub uri: String,
    pub title: String,
}

/// A span of generated text backed by one or more chunks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundingSupport {
    /// Byte offset where the supported segment starts
    pub start_index: usize,
    /// Byte offset one past the end of the supported segment
    pub end_index: usize,
    /// Indices into [`GroundingMetadata::chunks`]
    pub chunk_indices: Vec<usize>,
}

/// Creates model-specific clients from shared connection settings
///
/// A factory is built once per process and handed to the research
/// coordinator, which asks it for the clients each run needs.
pub trait LLMClientFactoryTrait: Send + Sync {
    /// Client for free-text and structured generation
    fn create_client(&self, model: &str) -> Arc<dyn LLMClient>;

    /// Client for grounded search
    fn create_search_client(&self, model: &str) -> Arc<dyn GroundedSearchClient>;
}

/// JSON schema for `T`, trimmed to what provider schema validators accept
pub fn response_schema<T: JsonSchema>() -> Result<serde_json::Value> {
    let schema = schemars::schema_for!(T);
    let mut value = serde_json::to_value(&schema)
        .map_err(|e| AppError::Internal(format!("Failed to serialize schema: {}", e)))?;

    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }

    Ok(value)
}

/// Schema-constrained generation decoded into `T`
///
/// A response that does not match the schema is treated as malformed and
/// reported as an internal error.
pub async fn generate_typed<T>(
    client: &dyn LLMClient,
    prompt: &str,
    options: GenerationOptions,
) -> Result<T>
where
    T: JsonSchema + DeserializeOwned,
{
    let schema = response_schema::<T>()?;
    let value = client.generate_structured(prompt, &schema, options).await?;

    serde_json::from_value(value).map_err(|e| {
        AppError::Internal(format!(
            "Structured response from {} did not match schema: {}",
            client.model_name(),
            e
        ))
    })
}
