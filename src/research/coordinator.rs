use crate::{
    llm::LLMClientFactoryTrait,
    research::{
        evaluator::SufficiencyEvaluator,
        fallback,
        finalizer::AnswerFinalizer,
        planner::QueryPlanner,
        prompts::research_topic,
        state::{ResearchTask, RunState, Transition, WorkerOutput},
        worker::ResearchWorker,
    },
    types::{AppError, Message, Result, SourceCitation},
    utils::toml_config::ResearchConfig,
};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Per-run overrides; unset fields fall back to configuration
#[derive(Debug, Clone, Default)]
pub struct ResearchOptions {
    pub initial_query_count: Option<usize>,
    pub max_rounds: Option<usize>,
    pub reasoning_model: Option<String>,
}

/// What happened in one research round
#[derive(Debug, Clone, Serialize)]
pub struct RoundSummary {
    pub round: usize,
    pub queries: Vec<String>,
    pub results_merged: usize,
    pub sufficient: bool,
    pub knowledge_gap: String,
}

/// Result of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct ResearchOutcome {
    pub run_id: String,
    pub answer: Message,
    pub cited_sources: Vec<SourceCitation>,
    /// Full conversation, ending with `answer`
    pub conversation: Vec<Message>,
    pub rounds: usize,
    pub round_summaries: Vec<RoundSummary>,
    pub executed_queries: Vec<String>,
    pub knowledge_gap: String,
    pub duration_ms: u64,
}

/// Drives the plan / research / reflect / answer loop
pub struct ResearchCoordinator {
    factory: Arc<dyn LLMClientFactoryTrait>,
    config: ResearchConfig,
}

impl ResearchCoordinator {
    pub fn new(factory: Arc<dyn LLMClientFactoryTrait>, config: ResearchConfig) -> Self {
        Self { factory, config }
    }

    /// Research a single question
    pub async fn run(&self, topic: &str, options: ResearchOptions) -> Result<ResearchOutcome> {
        self.run_with_cancellation(topic, options, CancellationToken::new())
            .await
    }

    pub async fn run_with_cancellation(
        &self,
        topic: &str,
        options: ResearchOptions,
        cancel: CancellationToken,
    ) -> Result<ResearchOutcome> {
        self.run_conversation(vec![Message::user(topic)], options, cancel)
            .await
    }

    /// Research the topic implied by a whole conversation.
    ///
    /// Cancelling `cancel` aborts in-flight workers and discards everything
    /// gathered so far; the run then returns [`AppError::Cancelled`].
    pub async fn run_conversation(
        &self,
        conversation: Vec<Message>,
        options: ResearchOptions,
        cancel: CancellationToken,
    ) -> Result<ResearchOutcome> {
        if conversation.is_empty() {
            return Err(AppError::InvalidInput(
                "conversation must contain at least one message".to_string(),
            ));
        }

        let initial_query_count = options
            .initial_query_count
            .unwrap_or(self.config.number_of_initial_queries);
        let max_rounds = options.max_rounds.unwrap_or(self.config.max_research_loops);
        if initial_query_count == 0 {
            return Err(AppError::InvalidInput(
                "initial query count must be at least 1".to_string(),
            ));
        }
        if max_rounds == 0 {
            return Err(AppError::InvalidInput(
                "max rounds must be at least 1".to_string(),
            ));
        }
        let reasoning_model = options
            .reasoning_model
            .unwrap_or_else(|| self.config.reasoning_model.clone());

        let started = Instant::now();
        let run_id = new_run_id();
        let topic = research_topic(&conversation);
        let mut state = RunState::new(
            run_id.clone(),
            conversation,
            initial_query_count,
            max_rounds,
        );

        tracing::info!(
            "Starting research run {} (queries: {}, max rounds: {}, reasoning model: {})",
            run_id,
            initial_query_count,
            max_rounds,
            reasoning_model
        );

        let query_model = &self.config.query_generator_model;
        let planner = QueryPlanner::new(self.factory.create_client(query_model));
        let worker = ResearchWorker::new(self.factory.create_search_client(query_model), &run_id);
        let reasoning_llm = self.factory.create_client(&reasoning_model);
        let evaluator = SufficiencyEvaluator::new(reasoning_llm.clone());
        let finalizer = AnswerFinalizer::new(reasoning_llm);

        let mut batch = until_cancelled(
            &cancel,
            planner.plan_initial(&topic, state.initial_query_count),
        )
        .await?;
        let mut round_summaries = Vec::new();

        loop {
            let tasks = state.begin_round(batch);
            tracing::info!(
                "Research round {}/{}: {} queries",
                state.round_count + 1,
                state.max_rounds,
                tasks.len()
            );

            let outputs = fan_out(&worker, tasks, &cancel).await?;
            let results_merged = outputs.len();
            for output in outputs {
                state.merge(output);
            }
            state.enter_evaluation();

            let evaluation = until_cancelled(
                &cancel,
                evaluator.evaluate(&topic, &state.research_results),
            )
            .await?;
            state.apply_evaluation(evaluation);

            round_summaries.push(RoundSummary {
                round: state.round_count,
                queries: state.query_batch.clone(),
                results_merged,
                sufficient: state.sufficient.unwrap_or(true),
                knowledge_gap: state.knowledge_gap.clone(),
            });

            match state.next_transition() {
                Transition::Research(follow_ups) => {
                    tracing::info!(
                        "Round {} insufficient, continuing with {} follow-up queries",
                        state.round_count,
                        follow_ups.len()
                    );
                    batch = follow_ups;
                }
                Transition::Finalize => break,
            }
        }

        state.begin_finalizing();
        let final_answer = until_cancelled(
            &cancel,
            finalizer.finalize(&topic, &state.research_results, &state.sources),
        )
        .await?;

        let answer = Message::assistant(final_answer.answer_text);
        state.finish(answer.clone());

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            "Research run {} finished after {} rounds, {} queries, {} ms",
            run_id,
            state.round_count,
            state.executed_queries.len(),
            duration_ms
        );

        Ok(ResearchOutcome {
            run_id,
            answer,
            cited_sources: final_answer.cited_sources,
            conversation: state.conversation,
            rounds: state.round_count,
            round_summaries,
            executed_queries: state.executed_queries,
            knowledge_gap: state.knowledge_gap,
            duration_ms,
        })
    }
}

/// Run every task concurrently and wait for all of them.
///
/// Outputs come back in completion order. A task that panics is replaced by
/// a degraded output for its query.
async fn fan_out(
    worker: &ResearchWorker,
    tasks: Vec<ResearchTask>,
    cancel: &CancellationToken,
) -> Result<Vec<WorkerOutput>> {
    let mut set = JoinSet::new();
    let mut pending = HashMap::with_capacity(tasks.len());

    for task in tasks {
        let worker = worker.clone();
        let query = task.query_text.clone();
        let handle = set.spawn(async move { worker.research(task).await });
        pending.insert(handle.id(), query);
    }

    let mut outputs = Vec::with_capacity(pending.len());
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            joined = set.join_next_with_id() => Some(joined),
        };
        let Some(joined) = next else {
            tracing::warn!("Research cancelled with {} tasks in flight", set.len());
            set.abort_all();
            return Err(AppError::Cancelled);
        };

        match joined {
            Some(Ok((id, output))) => {
                pending.remove(&id);
                outputs.push(output);
            }
            Some(Err(e)) => {
                let query = pending.remove(&e.id()).unwrap_or_default();
                tracing::error!("Research task for query '{}' failed: {}", query, e);
                outputs.push(fallback::degrade(
                    &AppError::Internal(format!("research task failed: {}", e)),
                    &query,
                ));
            }
            None => break,
        }
    }

    Ok(outputs)
}

async fn until_cancelled<F: Future>(cancel: &CancellationToken, future: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        output = future => Ok(output),
    }
}

/// Short random run id used to namespace source handles
fn new_run_id() -> String {
    Uuid::new_v4().simple().to_string().chars().take(8).collect()
}
