//! Mock implementations for testing.
//!
//! This module provides scripted generation and search clients plus a
//! factory that hands them to the research coordinator, so research runs can
//! be driven end to end without network access.

#![allow(dead_code)]

use async_trait::async_trait;
use prosearch::llm::{
    GenerationOptions, GroundedCandidate, GroundedResponse, GroundedSearchClient, GroundingChunk,
    GroundingMetadata, GroundingSupport, LLMClient, LLMClientFactoryTrait,
};
use prosearch::types::{AppError, Result};
use prosearch::utils::toml_config::ResearchConfig;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Model name the factory maps to the query-writing client
pub const QUERY_MODEL: &str = "mock-query";

/// Default reasoning model name in [`research_config`]
pub const REASONING_MODEL: &str = "mock-reasoning";

/// Research configuration wired to the mock model names
pub fn research_config() -> ResearchConfig {
    ResearchConfig {
        number_of_initial_queries: 3,
        max_research_loops: 2,
        query_generator_model: QUERY_MODEL.to_string(),
        reasoning_model: REASONING_MODEL.to_string(),
    }
}

/// Failure classes a mock can simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Quota,
    Service,
    Unexpected,
}

impl MockFailure {
    pub fn error(self) -> AppError {
        match self {
            MockFailure::Quota => AppError::Quota("HTTP 429: RESOURCE_EXHAUSTED".to_string()),
            MockFailure::Service => AppError::LLM("HTTP 503: backend unavailable".to_string()),
            MockFailure::Unexpected => AppError::Internal("mock internal failure".to_string()),
        }
    }
}

type Scripted<T> = std::result::Result<T, MockFailure>;

enum TextReply {
    Fixed(Scripted<String>),
    /// Reply with the prompt itself
    Echo,
}

/// Mock generation client with scripted replies.
///
/// Structured replies are consumed in order; the last one repeats once the
/// queue is down to a single entry. Every prompt is recorded.
pub struct MockLLMClient {
    model: String,
    text: TextReply,
    structured: Mutex<VecDeque<Scripted<Value>>>,
    text_prompts: Mutex<Vec<String>>,
    structured_prompts: Mutex<Vec<String>>,
}

impl MockLLMClient {
    /// Create a new mock client that answers free-text requests with `text`.
    pub fn new(model: &str, text: &str) -> Self {
        Self::with_text_reply(model, TextReply::Fixed(Ok(text.to_string())))
    }

    /// Create a mock client whose free-text replies echo the prompt.
    pub fn echoing(model: &str) -> Self {
        Self::with_text_reply(model, TextReply::Echo)
    }

    /// Create a mock client whose free-text requests always fail.
    pub fn failing_text(model: &str, failure: MockFailure) -> Self {
        Self::with_text_reply(model, TextReply::Fixed(Err(failure)))
    }

    fn with_text_reply(model: &str, text: TextReply) -> Self {
        Self {
            model: model.to_string(),
            text,
            structured: Mutex::new(VecDeque::new()),
            text_prompts: Mutex::new(Vec::new()),
            structured_prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a structured reply
    pub fn then_structured(self, value: Value) -> Self {
        self.structured.lock().unwrap().push_back(Ok(value));
        self
    }

    /// Queue a structured failure
    pub fn then_structured_failure(self, failure: MockFailure) -> Self {
        self.structured.lock().unwrap().push_back(Err(failure));
        self
    }

    pub fn text_prompts(&self) -> Vec<String> {
        self.text_prompts.lock().unwrap().clone()
    }

    pub fn structured_prompts(&self) -> Vec<String> {
        self.structured_prompts.lock().unwrap().clone()
    }

    fn next_structured(&self) -> Scripted<Value> {
        let mut queue = self.structured.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap_or(Err(MockFailure::Unexpected))
        } else {
            queue.front().cloned().unwrap_or(Err(MockFailure::Unexpected))
        }
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str, _options: GenerationOptions) -> Result<String> {
        self.text_prompts.lock().unwrap().push(prompt.to_string());
        match &self.text {
            TextReply::Fixed(Ok(text)) => Ok(text.clone()),
            TextReply::Fixed(Err(failure)) => Err(failure.error()),
            TextReply::Echo => Ok(prompt.to_string()),
        }
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        _schema: &Value,
        _options: GenerationOptions,
    ) -> Result<Value> {
        self.structured_prompts
            .lock()
            .unwrap()
            .push(prompt.to_string());
        self.next_structured().map_err(MockFailure::error)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Mock grounded-search client.
///
/// Replies with `Findings about {query}.` where the query is read back from
/// the search prompt. In grounded mode every call cites one unique URL
/// covering the whole text.
pub struct MockSearchClient {
    grounded: bool,
    failures: Vec<(String, MockFailure)>,
    panics: Vec<String>,
    delays: Vec<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockSearchClient {
    pub fn grounded() -> Self {
        Self::new(true)
    }

    pub fn ungrounded() -> Self {
        Self::new(false)
    }

    fn new(grounded: bool) -> Self {
        Self {
            grounded,
            failures: Vec::new(),
            panics: Vec::new(),
            delays: Vec::new(),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Fail every query containing `needle`; an empty needle matches all
    pub fn failing_for(mut self, needle: &str, failure: MockFailure) -> Self {
        self.failures.push((needle.to_string(), failure));
        self
    }

    /// Panic inside the search for every query containing `needle`
    pub fn panicking_for(mut self, needle: &str) -> Self {
        self.panics.push(needle.to_string());
        self
    }

    /// Per-call latency, cycled by call order
    pub fn with_delays(mut self, delays: Vec<Duration>) -> Self {
        self.delays = delays;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of searches observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn query_from_prompt(prompt: &str) -> String {
        prompt
            .rsplit("Research Topic:\n")
            .next()
            .unwrap_or(prompt)
            .trim()
            .to_string()
    }
}

#[async_trait]
impl GroundedSearchClient for MockSearchClient {
    async fn search(&self, prompt: &str, _options: GenerationOptions) -> Result<GroundedResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if !self.delays.is_empty() {
            tokio::time::sleep(self.delays[call % self.delays.len()]).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let query = Self::query_from_prompt(prompt);
        if self.panics.iter().any(|needle| query.contains(needle.as_str())) {
            panic!("search backend crashed: secret-internal-state");
        }
        if let Some((_, failure)) = self
            .failures
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
        {
            return Err(failure.error());
        }

        let text = format!("Findings about {}.", query);
        let grounding = self.grounded.then(|| GroundingMetadata {
            chunks: vec![GroundingChunk {
                uri: format!("https://source.example/{}", call),
                title: "source.example".to_string(),
            }],
            supports: vec![GroundingSupport {
                start_index: 0,
                end_index: text.len(),
                chunk_indices: vec![0],
            }],
        });

        Ok(GroundedResponse {
            candidates: vec![GroundedCandidate { text, grounding }],
        })
    }

    fn model_name(&self) -> &str {
        QUERY_MODEL
    }
}

/// Mock factory routing [`QUERY_MODEL`] to the query client and every other
/// model name to the reasoning client.
pub struct MockFactory {
    pub query: Arc<MockLLMClient>,
    pub reasoning: Arc<MockLLMClient>,
    pub search: Arc<MockSearchClient>,
    requested: Mutex<Vec<String>>,
}

impl MockFactory {
    pub fn new(query: MockLLMClient, reasoning: MockLLMClient, search: MockSearchClient) -> Self {
        Self {
            query: Arc::new(query),
            reasoning: Arc::new(reasoning),
            search: Arc::new(search),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Model names requested so far, in order
    pub fn requested_models(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl LLMClientFactoryTrait for MockFactory {
    fn create_client(&self, model: &str) -> Arc<dyn LLMClient> {
        self.requested.lock().unwrap().push(model.to_string());
        if model == QUERY_MODEL {
            return self.query.clone();
        }
        self.reasoning.clone()
    }

    fn create_search_client(&self, model: &str) -> Arc<dyn GroundedSearchClient> {
        self.requested.lock().unwrap().push(model.to_string());
        self.search.clone()
    }
}
