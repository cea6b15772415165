//! Run state and the transition rules of the research loop.
//!
//! [`RunState`] is owned by the coordinator and is the only place research
//! results accumulate. Workers never touch it; they return [`WorkerOutput`]
//! values that the coordinator folds in with [`RunState::merge`].

use crate::research::evaluator::Evaluation;
use crate::types::{Message, SourceCitation};

/// Where a run currently is in the research loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Planning,
    Researching,
    Evaluating,
    Finalizing,
    Done,
}

/// What the coordinator does after an evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Fan out another round over these queries
    Research(Vec<String>),
    Finalize,
}

/// One fanned-out search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchTask {
    pub query_text: String,
    /// Unique across the run; namespaces the short handles a worker assigns
    pub sequence_id: usize,
}

/// Result of a single worker invocation, degraded or not
#[derive(Debug, Clone)]
pub struct WorkerOutput {
    pub query: String,
    pub result_text: String,
    pub citations: Vec<SourceCitation>,
}

#[derive(Debug, Clone)]
pub struct RunState {
    pub run_id: String,
    pub phase: Phase,
    pub conversation: Vec<Message>,
    pub query_batch: Vec<String>,
    pub executed_queries: Vec<String>,
    pub research_results: Vec<String>,
    pub sources: Vec<SourceCitation>,
    pub round_count: usize,
    pub max_rounds: usize,
    pub initial_query_count: usize,
    /// `None` until the first evaluation
    pub sufficient: Option<bool>,
    pub knowledge_gap: String,
    pub follow_up_queries: Vec<String>,
}

impl RunState {
    pub fn new(
        run_id: impl Into<String>,
        conversation: Vec<Message>,
        initial_query_count: usize,
        max_rounds: usize,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            phase: Phase::Planning,
            conversation,
            query_batch: Vec::new(),
            executed_queries: Vec::new(),
            research_results: Vec::new(),
            sources: Vec::new(),
            round_count: 0,
            max_rounds,
            initial_query_count,
            sufficient: None,
            knowledge_gap: String::new(),
            follow_up_queries: Vec::new(),
        }
    }

    /// Stage `queries` for the next round and expand them into tasks.
    ///
    /// Sequence ids continue from the number of queries executed so far, so
    /// short handles stay unique across the whole run.
    pub fn begin_round(&mut self, queries: Vec<String>) -> Vec<ResearchTask> {
        self.phase = Phase::Researching;
        self.query_batch = queries;

        let offset = self.executed_queries.len();
        self.query_batch
            .iter()
            .enumerate()
            .map(|(idx, query)| ResearchTask {
                query_text: query.clone(),
                sequence_id: offset + idx,
            })
            .collect()
    }

    /// Fold one worker's output into the run
    pub fn merge(&mut self, output: WorkerOutput) {
        self.executed_queries.push(output.query);
        self.research_results.push(output.result_text);
        self.sources.extend(output.citations);
    }

    /// Enter evaluation once the whole batch has merged
    pub fn enter_evaluation(&mut self) {
        self.phase = Phase::Evaluating;
        self.round_count += 1;
    }

    pub fn apply_evaluation(&mut self, evaluation: Evaluation) {
        self.sufficient = Some(evaluation.sufficient);
        self.knowledge_gap = evaluation.knowledge_gap;
        self.follow_up_queries = evaluation.follow_up_queries;
    }

    /// Decide whether to loop or finalize.
    ///
    /// Loops only while evidence is judged insufficient, rounds remain, and
    /// there is at least one follow-up query to run. An empty follow-up list
    /// counts as sufficient, otherwise the loop could spin without progress.
    pub fn next_transition(&self) -> Transition {
        let insufficient = self.sufficient == Some(false);
        let rounds_left = self.round_count < self.max_rounds;

        if insufficient && rounds_left && !self.follow_up_queries.is_empty() {
            Transition::Research(self.follow_up_queries.clone())
        } else {
            Transition::Finalize
        }
    }

    pub fn begin_finalizing(&mut self) {
        self.phase = Phase::Finalizing;
    }

    pub fn finish(&mut self, answer: Message) {
        self.conversation.push(answer);
        self.phase = Phase::Done;
    }
}
