//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for the two external services the
//! research loop depends on, hiding provider specifics behind traits.
//!
//! # Architecture
//!
//! - [`LLMClient`] - free-text and schema-constrained generation
//! - [`GroundedSearchClient`] - search-augmented generation with grounding metadata
//! - [`LLMClientFactoryTrait`] - creates model-specific clients for a run
//! - [`GeminiFactory`] - the Gemini REST implementation of the factory
//!
//! # Example
//!
//! ```ignore
//! use prosearch::llm::{GeminiFactory, GenerationOptions, LLMClientFactoryTrait};
//!
//! let factory = GeminiFactory::from_config(&config)?;
//! let client = factory.create_client("gemini-2.5-flash");
//!
//! let response = client.generate("What is 2+2?", GenerationOptions::deterministic()).await?;
//! println!("{}", response);
//! ```
//!
//! # Errors
//!
//! Provider failures are classified so callers can degrade appropriately:
//! quota exhaustion surfaces as `AppError::Quota`, structured service
//! failures as `AppError::LLM`, and transport or decoding problems as
//! `AppError::Internal`.

/// Core LLM client traits and grounded-search response types.
pub mod client;
/// Gemini `generateContent` client.
pub mod gemini;
/// Failure classification and retry policy.
pub mod retry;

pub use client::{
    generate_typed, GenerationOptions, GroundedCandidate, GroundedResponse, GroundedSearchClient,
    GroundingChunk, GroundingMetadata, GroundingSupport, LLMClient, LLMClientFactoryTrait,
};
pub use gemini::{GeminiClient, GeminiFactory};
pub use retry::RetryPolicy;
