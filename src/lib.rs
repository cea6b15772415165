//! # prosearch - Iterative Multi-Round Research
//!
//! A research agent that answers a question by searching the web in rounds:
//! it plans a batch of queries, runs them concurrently against a grounded
//! search model, reflects on whether the evidence is sufficient, and either
//! loops with follow-up queries or writes a final answer with citations.
//!
//! ## Overview
//!
//! prosearch can be used in two ways:
//!
//! 1. **As a command-line tool** - Run the `prosearch` binary
//! 2. **As a library** - Embed [`ResearchCoordinator`] in your own Rust project
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use prosearch::{GeminiFactory, ProsearchConfig, ResearchCoordinator, ResearchOptions};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProsearchConfig::load_or_default("prosearch.toml")?;
//!     let factory = Arc::new(GeminiFactory::from_config(&config)?);
//!
//!     let coordinator = ResearchCoordinator::new(factory, config.research.clone());
//!     let outcome = coordinator
//!         .run("How do solid-state batteries work?", ResearchOptions::default())
//!         .await?;
//!
//!     println!("{}", outcome.answer.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`research`] - Planner, workers, evaluator, finalizer and the loop controller
//! - [`llm`] - Generation and grounded-search clients (Gemini)
//! - [`utils`] - TOML configuration
//! - [`types`] - Common types and error handling
//! - [`cli`] - Command-line parsing and output

/// Command-line interface.
pub mod cli;
/// LLM and grounded-search clients.
pub mod llm;
/// The research loop and its stages.
pub mod research;
/// Core types (messages, citations, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use llm::{GeminiFactory, GroundedSearchClient, LLMClient, LLMClientFactoryTrait};
pub use research::{ResearchCoordinator, ResearchOptions, ResearchOutcome};
pub use types::{AppError, Message, Result, SourceCitation};
pub use utils::toml_config::{ConfigError, ProsearchConfig};
