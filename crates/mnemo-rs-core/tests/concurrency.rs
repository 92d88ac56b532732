//! Concurrent and cancelled turns.

use mnemo_rs_config::SummaryConfig;
use mnemo_rs_core::Orchestrator;
use mnemo_rs_memory::{
    InMemoryKeyValue, InMemorySearchIndex, LongTermStore, MemoryRecallOptions, Role,
    ShortTermStore,
};
use mnemo_rs_test_utils::{HashingEmbedder, SlowGenerator};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn orchestrator(generator: SlowGenerator, serialize: bool) -> Orchestrator {
    Orchestrator::builder()
        .short_term(ShortTermStore::new(Arc::new(InMemoryKeyValue::new()), 10))
        .long_term(LongTermStore::new(
            Arc::new(InMemorySearchIndex::new()),
            Arc::new(HashingEmbedder::default()),
            "facts",
            MemoryRecallOptions::default(),
        ))
        .generator(Arc::new(generator))
        .summary(SummaryConfig::default())
        .serialize_session_turns(serialize)
        .build()
        .expect("orchestrator")
}

async fn user_messages(orchestrator: &Orchestrator, session_id: &str) -> Vec<String> {
    orchestrator
        .short_term()
        .get_context(session_id)
        .await
        .expect("context")
        .recent
        .into_iter()
        .filter(|message| message.role == Role::User)
        .map(|message| message.content)
        .collect()
}

/// Without serialization the log follows completion order, not submission order.
#[tokio::test]
async fn concurrent_turns_in_one_session_may_reorder() {
    let generator =
        SlowGenerator::with_delays([Duration::from_millis(200), Duration::from_millis(10)]);
    let orchestrator = orchestrator(generator, false);

    let (first, second) = tokio::join!(orchestrator.run_turn("s1", "A"), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        orchestrator.run_turn("s1", "B").await
    });
    first.expect("turn A");
    second.expect("turn B");

    assert_eq!(user_messages(&orchestrator, "s1").await, vec!["B", "A"]);
    let context = orchestrator
        .short_term()
        .get_context("s1")
        .await
        .expect("context");
    let roles: Vec<Role> = context.recent.iter().map(|message| message.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

/// With per-session serialization the log follows submission order.
#[tokio::test]
async fn serialized_turns_keep_submission_order() {
    let generator =
        SlowGenerator::with_delays([Duration::from_millis(200), Duration::from_millis(10)]);
    let orchestrator = orchestrator(generator, true);

    let (first, second) = tokio::join!(orchestrator.run_turn("s1", "A"), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        orchestrator.run_turn("s1", "B").await
    });
    first.expect("turn A");
    second.expect("turn B");

    assert_eq!(user_messages(&orchestrator, "s1").await, vec!["A", "B"]);
}

/// Serialization is per session: different sessions still run side by side.
#[tokio::test]
async fn serialization_does_not_block_other_sessions() {
    let orchestrator = orchestrator(SlowGenerator::new(Duration::from_millis(150)), true);
    let started = Instant::now();
    let (first, second) = tokio::join!(
        orchestrator.run_turn("s1", "hello"),
        orchestrator.run_turn("s2", "hello")
    );
    first.expect("s1");
    second.expect("s2");
    assert!(started.elapsed() < Duration::from_millis(290));
}

/// A turn cancelled while generating leaves a valid log behind.
#[tokio::test]
async fn cancelled_turn_leaves_log_usable() {
    let generator = SlowGenerator::with_delays([Duration::from_millis(500)]);
    let orchestrator = orchestrator(generator, true);

    let cancelled = tokio::time::timeout(
        Duration::from_millis(20),
        orchestrator.run_turn("s1", "abandoned"),
    )
    .await;
    assert!(cancelled.is_err());
    assert_eq!(user_messages(&orchestrator, "s1").await, Vec::<String>::new());

    let outcome = orchestrator.run_turn("s1", "retry").await.expect("turn");
    assert!(outcome.is_clean());
    assert_eq!(user_messages(&orchestrator, "s1").await, vec!["retry"]);
}
