//! End-to-end research runs against scripted clients.

mod common;

use common::mocks::{
    research_config, MockFactory, MockFailure, MockLLMClient, MockSearchClient, QUERY_MODEL,
    REASONING_MODEL,
};
use prosearch::research::sources::{short_handle, HANDLE_BASE};
use prosearch::research::{ResearchCoordinator, ResearchOptions};
use prosearch::types::{AppError, Message, MessageRole};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn queries(list: &[&str]) -> Value {
    json!({ "query": list, "rationale": "test" })
}

fn reflection(sufficient: bool, follow_ups: &[&str]) -> Value {
    let knowledge_gap = if sufficient { "" } else { "needs more detail" };
    json!({
        "is_sufficient": sufficient,
        "knowledge_gap": knowledge_gap,
        "follow_up_queries": follow_ups
    })
}

fn coordinator(factory: &Arc<MockFactory>) -> ResearchCoordinator {
    ResearchCoordinator::new(factory.clone(), research_config())
}

fn options(initial_query_count: usize, max_rounds: usize) -> ResearchOptions {
    ResearchOptions {
        initial_query_count: Some(initial_query_count),
        max_rounds: Some(max_rounds),
        reasoning_model: None,
    }
}

#[tokio::test]
async fn test_single_round_with_failed_reflection() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "")
            .then_structured(queries(&["quantum computing basics explained"])),
        MockLLMClient::new(REASONING_MODEL, "Quantum computers use qubits.")
            .then_structured_failure(MockFailure::Unexpected),
        MockSearchClient::ungrounded(),
    ));

    let outcome = coordinator(&factory)
        .run("quantum computing basics", options(1, 1))
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 1);
    assert!(outcome.cited_sources.is_empty());
    assert_eq!(outcome.answer.content, "Quantum computers use qubits.");
    assert_eq!(outcome.answer.role, MessageRole::Assistant);
    assert_eq!(outcome.conversation.len(), 2);
    assert_eq!(
        outcome.executed_queries,
        vec!["quantum computing basics explained"]
    );
    assert!(outcome.knowledge_gap.contains("unexpected error"));

    let answer_prompts = factory.reasoning.text_prompts();
    assert_eq!(answer_prompts.len(), 1);
    assert!(answer_prompts[0].contains("Findings about quantum computing basics explained."));
}

#[tokio::test]
async fn test_quota_exhaustion_still_finalizes() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "").then_structured(queries(&["foo", "bar"])),
        MockLLMClient::new(REASONING_MODEL, "Summary").then_structured(reflection(true, &[])),
        MockSearchClient::ungrounded().failing_for("", MockFailure::Quota),
    ));

    let outcome = coordinator(&factory)
        .run("topic", options(2, 2))
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.executed_queries.len(), 2);
    assert!(outcome.cited_sources.is_empty());
    assert_eq!(outcome.answer.content, "Summary");

    let reflection_prompt = &factory.reasoning.structured_prompts()[0];
    assert!(reflection_prompt.contains("API Quota Exhausted"));
    assert!(reflection_prompt.contains("'foo'"));
    assert!(reflection_prompt.contains("'bar'"));
}

#[tokio::test]
async fn test_grounded_sources_are_restored_in_answer() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "").then_structured(queries(&["foo", "bar"])),
        MockLLMClient::echoing(REASONING_MODEL).then_structured(reflection(true, &[])),
        MockSearchClient::grounded().failing_for("bar", MockFailure::Service),
    ));

    let outcome = coordinator(&factory)
        .run("topic", options(2, 1))
        .await
        .unwrap();

    let answer = &outcome.answer.content;
    assert!(answer.contains("Findings about foo."));
    assert!(answer.contains("https://source.example/"));
    assert!(answer.contains("Search API Error"));
    assert!(!answer.contains(HANDLE_BASE));

    assert_eq!(outcome.cited_sources.len(), 1);
    assert!(answer.contains(&outcome.cited_sources[0].original_value));
    assert_eq!(outcome.cited_sources[0].label, "source");
}

#[tokio::test]
async fn test_always_insufficient_stops_at_max_rounds() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "").then_structured(queries(&["q1", "q2"])),
        MockLLMClient::new(REASONING_MODEL, "Answer")
            .then_structured(reflection(false, &["deeper"])),
        MockSearchClient::ungrounded(),
    ));

    let outcome = coordinator(&factory)
        .run("topic", options(2, 3))
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 3);
    assert_eq!(factory.search.calls(), 4);
    assert_eq!(outcome.executed_queries.len(), 4);
    assert_eq!(factory.reasoning.structured_prompts().len(), 3);
    assert_eq!(factory.reasoning.text_prompts().len(), 1);

    let rounds: Vec<usize> = outcome.round_summaries.iter().map(|r| r.round).collect();
    assert_eq!(rounds, vec![1, 2, 3]);
    assert_eq!(outcome.round_summaries[1].queries, vec!["deeper"]);
    assert!(outcome.round_summaries.iter().all(|r| !r.sufficient));
}

#[tokio::test]
async fn test_insufficient_without_follow_ups_finalizes() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "").then_structured(queries(&["q1", "q2"])),
        MockLLMClient::new(REASONING_MODEL, "Answer").then_structured(reflection(false, &[])),
        MockSearchClient::ungrounded(),
    ));

    let outcome = coordinator(&factory)
        .run("topic", options(2, 5))
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 1);
    assert_eq!(factory.search.calls(), 2);
    assert_eq!(outcome.answer.content, "Answer");
}

#[tokio::test]
async fn test_handles_unique_across_rounds_and_failed_answer_keeps_all_sources() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "").then_structured(queries(&["a", "b"])),
        MockLLMClient::failing_text(REASONING_MODEL, MockFailure::Service)
            .then_structured(reflection(false, &["c", "d"]))
            .then_structured(reflection(true, &[])),
        MockSearchClient::grounded(),
    ));

    let outcome = coordinator(&factory)
        .run("topic", options(2, 2))
        .await
        .unwrap();

    assert_eq!(outcome.rounds, 2);
    assert!(outcome.answer.content.starts_with("# Research Summary"));
    assert!(outcome.answer.content.contains("### Research Result 4"));
    assert_eq!(outcome.cited_sources.len(), 4);

    let handles: Vec<&str> = outcome
        .cited_sources
        .iter()
        .map(|s| s.short_handle.as_str())
        .collect();
    for (i, a) in handles.iter().enumerate() {
        for (j, b) in handles.iter().enumerate() {
            if i != j {
                assert!(!a.contains(b), "{} contains {}", a, b);
            }
        }
    }

    let mut expected: Vec<String> = (0..4)
        .map(|seq| short_handle(&outcome.run_id, seq, 0))
        .collect();
    let mut actual: Vec<String> = handles.iter().map(|h| h.to_string()).collect();
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected);

    let second_reflection = &factory.reasoning.structured_prompts()[1];
    for query in ["a", "b", "c", "d"] {
        assert!(second_reflection.contains(&format!("Findings about {}.", query)));
    }
}

#[tokio::test]
async fn test_whole_batch_reaches_reflection_regardless_of_completion_order() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "")
            .then_structured(queries(&["alpha", "beta", "gamma"])),
        MockLLMClient::new(REASONING_MODEL, "Answer").then_structured(reflection(true, &[])),
        MockSearchClient::ungrounded().with_delays(vec![
            Duration::from_millis(30),
            Duration::from_millis(5),
            Duration::from_millis(15),
        ]),
    ));

    let outcome = coordinator(&factory)
        .run("topic", options(3, 1))
        .await
        .unwrap();

    assert_eq!(factory.search.max_in_flight(), 3);

    let mut executed = outcome.executed_queries.clone();
    executed.sort();
    assert_eq!(executed, vec!["alpha", "beta", "gamma"]);

    let prompts = factory.reasoning.structured_prompts();
    assert_eq!(prompts.len(), 1);
    for query in ["alpha", "beta", "gamma"] {
        assert!(prompts[0].contains(&format!("Findings about {}.", query)));
    }
    assert_eq!(outcome.round_summaries[0].results_merged, 3);
}

#[tokio::test]
async fn test_crashed_worker_becomes_degraded_result() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "").then_structured(queries(&["boom", "fine"])),
        MockLLMClient::new(REASONING_MODEL, "Answer").then_structured(reflection(true, &[])),
        MockSearchClient::ungrounded().panicking_for("boom"),
    ));

    let outcome = coordinator(&factory)
        .run("topic", options(2, 1))
        .await
        .unwrap();

    let mut executed = outcome.executed_queries.clone();
    executed.sort();
    assert_eq!(executed, vec!["boom", "fine"]);
    assert_eq!(outcome.round_summaries[0].results_merged, 2);

    let reflection_prompt = &factory.reasoning.structured_prompts()[0];
    assert!(reflection_prompt.contains("Research Error"));
    assert!(reflection_prompt.contains("'boom'"));
    assert!(reflection_prompt.contains("Findings about fine."));
    assert!(!reflection_prompt.contains("secret-internal-state"));
    assert!(!factory.reasoning.text_prompts()[0].contains("secret-internal-state"));
    assert_eq!(outcome.answer.content, "Answer");
}

#[tokio::test]
async fn test_reasoning_model_override() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "").then_structured(queries(&["q"])),
        MockLLMClient::new("mock-override", "Answer").then_structured(reflection(true, &[])),
        MockSearchClient::ungrounded(),
    ));

    let options = ResearchOptions {
        reasoning_model: Some("mock-override".to_string()),
        ..options(1, 1)
    };
    coordinator(&factory).run("topic", options).await.unwrap();

    let requested = factory.requested_models();
    assert!(requested.iter().any(|m| m == "mock-override"));
    assert!(requested.iter().any(|m| m == QUERY_MODEL));
    assert!(!requested.iter().any(|m| m == REASONING_MODEL));
}

#[tokio::test]
async fn test_defaults_come_from_configuration() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "").then_structured(queries(&["q1", "q2", "q3", "q4"])),
        MockLLMClient::new(REASONING_MODEL, "Answer").then_structured(reflection(true, &[])),
        MockSearchClient::ungrounded(),
    ));

    let outcome = coordinator(&factory)
        .run("topic", ResearchOptions::default())
        .await
        .unwrap();

    assert!(factory.query.structured_prompts()[0].contains("Do not produce more than 3 queries."));
    assert_eq!(outcome.executed_queries.len(), 3);
    assert!(factory
        .requested_models()
        .iter()
        .any(|m| m == REASONING_MODEL));
}

#[tokio::test]
async fn test_planner_failure_uses_topic_as_query() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "").then_structured_failure(MockFailure::Quota),
        MockLLMClient::new(REASONING_MODEL, "Answer").then_structured(reflection(true, &[])),
        MockSearchClient::ungrounded(),
    ));

    let outcome = coordinator(&factory)
        .run("solid state batteries", options(3, 1))
        .await
        .unwrap();

    assert_eq!(outcome.executed_queries, vec!["solid state batteries"]);
}

#[tokio::test]
async fn test_conversation_history_becomes_topic() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "").then_structured(queries(&["q"])),
        MockLLMClient::new(REASONING_MODEL, "Answer").then_structured(reflection(true, &[])),
        MockSearchClient::ungrounded(),
    ));

    let conversation = vec![
        Message::user("first question"),
        Message::assistant("first answer"),
        Message::user("and the follow-up?"),
    ];
    let outcome = coordinator(&factory)
        .run_conversation(conversation, options(1, 1), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.conversation.len(), 4);
    assert!(factory.query.structured_prompts()[0]
        .contains("User: first question\nAssistant: first answer\nUser: and the follow-up?"));
}

#[tokio::test]
async fn test_cancellation_mid_batch_discards_run() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "").then_structured(queries(&["slow one", "slow two"])),
        MockLLMClient::new(REASONING_MODEL, "Answer").then_structured(reflection(true, &[])),
        MockSearchClient::ungrounded().with_delays(vec![Duration::from_secs(30)]),
    ));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = coordinator(&factory)
        .run_with_cancellation("topic", options(2, 2), cancel)
        .await;

    assert!(matches!(result, Err(AppError::Cancelled)));
    assert!(factory.reasoning.structured_prompts().is_empty());
    assert!(factory.reasoning.text_prompts().is_empty());
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, "").then_structured(queries(&["q"])),
        MockLLMClient::new(REASONING_MODEL, "Answer"),
        MockSearchClient::ungrounded(),
    ));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = coordinator(&factory)
        .run_with_cancellation("topic", options(1, 1), cancel)
        .await;

    assert!(matches!(result, Err(AppError::Cancelled)));
    assert!(factory.query.structured_prompts().is_empty());
    assert_eq!(factory.search.calls(), 0);
}

#[tokio::test]
async fn test_zero_limits_are_rejected() {
    let factory = Arc::new(MockFactory::new(
        MockLLMClient::new(QUERY_MODEL, ""),
        MockLLMClient::new(REASONING_MODEL, ""),
        MockSearchClient::ungrounded(),
    ));
    let coordinator = coordinator(&factory);

    let result = coordinator.run("topic", options(0, 1)).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));

    let result = coordinator.run("topic", options(1, 0)).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));

    let result = coordinator
        .run_conversation(vec![], options(1, 1), CancellationToken::new())
        .await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}
