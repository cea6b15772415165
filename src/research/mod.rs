//! Iterative multi-round research
//!
//! A run plans a batch of search queries, fans them out to concurrent
//! grounded-search workers, reflects on whether the gathered evidence is
//! enough, and either loops with follow-up queries or writes a cited answer.
//!
//! # Architecture
//!
//! - [`coordinator::ResearchCoordinator`] - Owns the run state and drives the loop
//! - [`planner::QueryPlanner`] - Writes the first batch of queries
//! - [`worker::ResearchWorker`] - Runs one grounded search and cites its sources
//! - [`evaluator::SufficiencyEvaluator`] - Decides whether to keep researching
//! - [`finalizer::AnswerFinalizer`] - Writes the answer and restores source URLs
//!
//! # Usage
//!
//! ```ignore
//! use prosearch::research::{ResearchCoordinator, ResearchOptions};
//!
//! let coordinator = ResearchCoordinator::new(factory, config.research.clone());
//! let outcome = coordinator
//!     .run("What are the latest developments in quantum computing?", ResearchOptions::default())
//!     .await?;
//!
//! println!("{}", outcome.answer.content);
//! for source in outcome.cited_sources {
//!     println!("- {} ({})", source.label, source.original_value);
//! }
//! ```
//!
//! # Failure handling
//!
//! Stage failures never abort a run. Workers degrade to an explanatory
//! result, the planner falls back to the topic itself, the evaluator stops
//! the loop, and the finalizer emits a report built from the raw results.
//! Only cancellation ends a run without an answer.

pub mod coordinator;
pub mod evaluator;
pub mod fallback;
pub mod finalizer;
pub mod planner;
pub mod prompts;
pub mod schemas;
pub mod sources;
pub mod state;
pub mod worker;

pub use coordinator::{ResearchCoordinator, ResearchOptions, ResearchOutcome, RoundSummary};
pub use evaluator::{Evaluation, SufficiencyEvaluator};
pub use fallback::ErrorClass;
pub use finalizer::{AnswerFinalizer, FinalAnswer};
pub use planner::QueryPlanner;
pub use state::{Phase, ResearchTask, RunState, Transition, WorkerOutput};
pub use worker::ResearchWorker;
