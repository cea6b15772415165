//! Prompt templates for each research stage.

use crate::types::{Message, MessageRole};
use chrono::Local;

/// Today's date as it appears in prompts, e.g. "March 04, 2025"
pub fn current_date() -> String {
    Local::now().format("%B %d, %Y").to_string()
}

/// The research topic for a conversation.
///
/// A single message is used as-is; longer histories are flattened into
/// `User:` / `Assistant:` lines so follow-up questions keep their context.
pub fn research_topic(messages: &[Message]) -> String {
    match messages {
        [only] => only.content.clone(),
        _ => messages
            .iter()
            .filter_map(|message| match message.role {
                MessageRole::User => Some(format!("User: {}\n", message.content)),
                MessageRole::Assistant => Some(format!("Assistant: {}\n", message.content)),
                MessageRole::System => None,
            })
            .collect(),
    }
}

pub fn query_writer_prompt(topic: &str, number_queries: usize, current_date: &str) -> String {
    format!(
        r#"Your goal is to generate sophisticated and diverse web search queries for an automated research tool that analyzes complex results, follows links and synthesizes information.

Instructions:
- Prefer a single search query; only add another when the question asks for multiple aspects or entities.
- Each query should focus on one specific aspect of the original question.
- Do not produce more than {number_queries} queries.
- Queries should be diverse; if the topic is broad, generate more than one query.
- Do not generate multiple similar queries, one is enough.
- Queries should ensure that the most current information is gathered. The current date is {current_date}.

Format:
- Respond with a JSON object containing exactly these keys:
  - "rationale": brief explanation of why these queries are relevant
  - "query": a list of search queries

Context: {topic}"#,
        number_queries = number_queries,
        current_date = current_date,
        topic = topic
    )
}

pub fn web_searcher_prompt(query: &str, current_date: &str) -> String {
    format!(
        r#"Conduct targeted web searches to gather the most recent, credible information on "{query}" and synthesize it into a verifiable text artifact.

Instructions:
- Query should ensure that the most current information is gathered. The current date is {current_date}.
- Conduct multiple, diverse searches to gather comprehensive information.
- Consolidate key findings while meticulously tracking the source(s) for each specific piece of information.
- The output should be a well-written summary or report based on your search findings.
- Only include the information found in the search results, do not make up any information.

Research Topic:
{query}"#,
        query = query,
        current_date = current_date
    )
}

pub fn reflection_prompt(topic: &str, summaries: &str, current_date: &str) -> String {
    format!(
        r#"You are an expert research assistant analyzing summaries about "{topic}". The current date is {current_date}.

Instructions:
- Identify knowledge gaps or areas that need deeper exploration and generate follow-up queries (one or more).
- If the provided summaries are sufficient to answer the user's question, do not generate any follow-up query.
- If there is a knowledge gap, generate follow-up queries that would help expand understanding.
- Focus on technical details, implementation specifics, or emerging trends that weren't fully covered.

Requirements:
- Each follow-up query must be self-contained and include the context needed for web search.

Output Format:
- Respond with a JSON object containing exactly these keys:
  - "is_sufficient": true or false
  - "knowledge_gap": describe what information is missing or needs clarification, empty if sufficient
  - "follow_up_queries": the specific questions that address the gap, empty if sufficient

Summaries:
{summaries}"#,
        topic = topic,
        current_date = current_date,
        summaries = summaries
    )
}

pub fn answer_prompt(topic: &str, summaries: &str, current_date: &str) -> String {
    format!(
        r#"Generate a high-quality answer to the user's question based on the provided summaries.

Instructions:
- The current date is {current_date}.
- You are the final step of a multi-step research process, don't mention that you are the final step.
- You have access to all the information gathered from the previous steps.
- Generate a high-quality answer to the user's question based on the provided summaries and the user's question.
- You MUST include all the citations from the summaries in the answer correctly, keeping each markdown link exactly as written.

User Context:
- {topic}

Summaries:
{summaries}"#,
        current_date = current_date,
        topic = topic,
        summaries = summaries
    )
}
