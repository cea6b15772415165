//! Gemini REST client
//!
//! Implements both [`LLMClient`] and [`GroundedSearchClient`] on top of the
//! `generateContent` endpoint. Grounded search enables the `google_search`
//! tool; structured output uses `responseJsonSchema`.

use crate::llm::client::{
    GenerationOptions, GroundedCandidate, GroundedResponse, GroundedSearchClient, GroundingChunk,
    GroundingMetadata, GroundingSupport, LLMClient, LLMClientFactoryTrait,
};
use crate::llm::retry::{ApiFailure, RetryPolicy};
use crate::types::{AppError, Result};
use crate::utils::toml_config::ProsearchConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(
        http: reqwest::Client,
        api_base: String,
        api_key: String,
        model: String,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            api_base,
            api_key,
            model,
            retry,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    fn request_body(prompt: &str, generation_config: Value) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": generation_config
        })
    }

    /// POST with bounded retries on transient failures
    async fn generate_content(&self, body: &Value) -> Result<GenerateContentResponse> {
        let mut attempt = 0;
        loop {
            match self.generate_content_once(body).await {
                Ok(response) => return Ok(response),
                Err(failure) if self.retry.should_retry(&failure, attempt) => {
                    let delay = self.retry.delay_for(&failure, attempt);
                    tracing::debug!(
                        "Gemini call to {} failed ({}), retrying in {:?}",
                        self.model,
                        failure,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.into()),
            }
        }
    }

    async fn generate_content_once(
        &self,
        body: &Value,
    ) -> std::result::Result<GenerateContentResponse, ApiFailure> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiFailure::network(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = error_body(response.text().await);
            return Err(ApiFailure::from_status(status.as_u16(), &text, retry_after));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| ApiFailure::parse(format!("Failed to parse response: {}", e)))
    }

    fn first_text(&self, response: GenerateContentResponse) -> Result<String> {
        response
            .candidates
            .into_iter()
            .next()
            .map(|candidate| candidate.text())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AppError::Internal(format!("No response from {}", self.model)))
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String> {
        let body = Self::request_body(prompt, json!({ "temperature": options.temperature }));
        let response = self.generate_content(&body).await?;
        self.first_text(response)
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &Value,
        options: GenerationOptions,
    ) -> Result<Value> {
        let body = Self::request_body(
            prompt,
            json!({
                "temperature": options.temperature,
                "responseMimeType": "application/json",
                "responseJsonSchema": schema
            }),
        );
        let response = self.generate_content(&body).await?;
        let text = self.first_text(response)?;

        serde_json::from_str(text.trim())
            .map_err(|e| AppError::Internal(format!("Model returned invalid JSON: {}", e)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl GroundedSearchClient for GeminiClient {
    async fn search(&self, prompt: &str, options: GenerationOptions) -> Result<GroundedResponse> {
        let mut body = Self::request_body(prompt, json!({ "temperature": options.temperature }));
        body["tools"] = json!([{ "google_search": {} }]);

        let response = self.generate_content(&body).await?;
        Ok(response.into_grounded())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Error body text, or a marker when the body itself could not be read
fn error_body<E: std::fmt::Display>(body: std::result::Result<String, E>) -> String {
    body.unwrap_or_else(|e| format!("<unreadable body: {}>", e))
}

// ============= Wire Types =============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<RawGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<RawChunk>,
    #[serde(default)]
    grounding_supports: Vec<RawSupport>,
}

#[derive(Debug, Deserialize)]
struct RawChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSupport {
    segment: Option<Segment>,
    #[serde(default)]
    grounding_chunk_indices: Vec<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Segment {
    #[serde(default)]
    start_index: usize,
    end_index: Option<usize>,
}

impl Candidate {
    fn text(&self) -> String {
        self.content
            .as_ref()
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl GenerateContentResponse {
    fn into_grounded(self) -> GroundedResponse {
        let candidates = self
            .candidates
            .into_iter()
            .map(|candidate| {
                let text = candidate.text();
                let grounding = candidate.grounding_metadata.map(|raw| GroundingMetadata {
                    // Keep one entry per raw chunk so support indices stay aligned
                    chunks: raw
                        .grounding_chunks
                        .into_iter()
                        .map(|chunk| {
                            let web = chunk.web;
                            GroundingChunk {
                                uri: web.as_ref().and_then(|w| w.uri.clone()).unwrap_or_default(),
                                title: web.and_then(|w| w.title).unwrap_or_default(),
                            }
                        })
                        .collect(),
                    supports: raw
                        .grounding_supports
                        .into_iter()
                        .filter_map(|support| {
                            let segment = support.segment?;
                            Some(GroundingSupport {
                                start_index: segment.start_index,
                                end_index: segment.end_index?,
                                chunk_indices: support.grounding_chunk_indices,
                            })
                        })
                        .collect(),
                });
                GroundedCandidate { text, grounding }
            })
            .collect();

        GroundedResponse { candidates }
    }
}

// ============= Factory =============

/// Builds Gemini clients sharing one pooled HTTP client
pub struct GeminiFactory {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    retry: RetryPolicy,
}

impl GeminiFactory {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.into(),
            api_key: api_key.into(),
            retry,
        })
    }

    /// Create a factory from configuration, resolving the API key from the environment
    pub fn from_config(config: &ProsearchConfig) -> Result<Self> {
        let api_key = config
            .api_key()
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        Self::new(
            config.provider.api_base.clone(),
            api_key,
            Duration::from_secs(config.provider.request_timeout_secs),
            RetryPolicy::new(config.provider.max_retries),
        )
    }

    fn client(&self, model: &str) -> GeminiClient {
        GeminiClient::new(
            self.http.clone(),
            self.api_base.clone(),
            self.api_key.clone(),
            model.to_string(),
            self.retry.clone(),
        )
    }
}

impl LLMClientFactoryTrait for GeminiFactory {
    fn create_client(&self, model: &str) -> Arc<dyn LLMClient> {
        Arc::new(self.client(model))
    }

    fn create_search_client(&self, model: &str) -> Arc<dyn GroundedSearchClient> {
        Arc::new(self.client(model))
    }
}
