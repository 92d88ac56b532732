//! Orchestrator integration tests with deterministic ports.

use autoagents_llm::LLMProvider;
use mnemo_rs_config::{BackendsConfig, MnemoConfig};
use mnemo_rs_core::{MnemoCoreError, Orchestrator, TurnWarning};
use mnemo_rs_memory::{
    InMemoryKeyValue, InMemorySearchIndex, KeyValueBackend, LongTermStore, MemoryError,
    MemoryRecallOptions, Role, SearchBackend, ShortTermStore,
};
use mnemo_rs_protocol::{EmbeddingPort, GenerationPort, PortError, PromptRole};
use mnemo_rs_test_utils::{
    EchoGenerator, FailingEmbedder, FailingGenerator, FailingSearchIndex, FixedGenerator,
    FixedLLM, HashingEmbedder, UnavailableKeyValue,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::tempdir;

struct Harness {
    orchestrator: Orchestrator,
    answers: FixedGenerator,
    summaries: EchoGenerator,
}

fn harness(window: usize) -> Harness {
    harness_with(
        window,
        Arc::new(InMemoryKeyValue::new()),
        Arc::new(InMemorySearchIndex::new()),
        Arc::new(HashingEmbedder::default()),
    )
}

fn harness_with(
    window: usize,
    kv: Arc<dyn KeyValueBackend>,
    search: Arc<dyn SearchBackend>,
    embedder: Arc<dyn EmbeddingPort>,
) -> Harness {
    let answers = FixedGenerator::new("ok");
    let summaries = EchoGenerator::new();
    let orchestrator = Orchestrator::builder()
        .short_term(ShortTermStore::new(kv, window))
        .long_term(LongTermStore::new(
            search,
            embedder,
            "facts",
            MemoryRecallOptions::default(),
        ))
        .generator(Arc::new(answers.clone()))
        .summary_generator(Arc::new(summaries.clone()))
        .build()
        .expect("orchestrator");
    Harness {
        orchestrator,
        answers,
        summaries,
    }
}

/// A plain turn answers and appends exactly one round.
#[tokio::test]
async fn turn_appends_one_round() {
    let h = harness(3);
    let outcome = h.orchestrator.run_turn("s1", "hello").await.expect("turn");
    assert_eq!(outcome.response, "ok");
    assert_eq!(outcome.session_id, "s1");
    assert!(outcome.is_clean());
    assert_eq!(outcome.recalled, Vec::new());
    assert_eq!(outcome.stored_fact_id, None);

    let store = h.orchestrator.short_term();
    let context = store.get_context("s1").await.expect("context");
    let turns: Vec<(Role, String)> = context
        .recent
        .iter()
        .map(|message| (message.role, message.content.clone()))
        .collect();
    assert_eq!(
        turns,
        vec![
            (Role::User, "hello".to_string()),
            (Role::Assistant, "ok".to_string())
        ]
    );
    assert!(store.get_access_time("s1").await.expect("time").is_some());

    let prompt = h.answers.last_prompt().expect("prompt");
    assert_eq!(prompt[0].role, PromptRole::System);
    assert!(prompt[1].content.ends_with("Current user input: hello"));
}

/// With W=2 the summary covers round 1 after round 3 and rounds 1-3 after round 5.
#[tokio::test]
async fn summary_is_regenerated_from_all_aged_rounds() {
    let h = harness(2);
    let store = h.orchestrator.short_term();
    let mut refreshed = Vec::new();
    for round in 1..=5 {
        let outcome = h
            .orchestrator
            .run_turn("s1", &format!("q{round}"))
            .await
            .expect("turn");
        refreshed.push(outcome.summary_refreshed);
        let context = store.get_context("s1").await.expect("context");
        assert_eq!(context.recent.len(), round.min(2) * 2);
        if round == 3 {
            let summary = context.summary_text().expect("summary after round 3");
            assert!(summary.contains("user: q1"));
            assert!(!summary.contains("q2"));
        }
        if round == 5 {
            let summary = context.summary_text().expect("summary after round 5");
            assert!(summary.contains("user: q1"));
            assert!(summary.contains("user: q2"));
            assert!(summary.contains("user: q3"));
            assert!(!summary.contains("q4"));
            assert!(!summary.contains("Conversation summary"));
        }
    }
    assert_eq!(refreshed, vec![false, false, true, true, true]);
    assert_eq!(h.summaries.call_count(), 3);

    let prompt = h.answers.last_prompt().expect("prompt");
    assert!(prompt[1].content.contains("[Conversation summary]"));
}

/// W=10, 22 rounds: summary from round 11 on, window stays at 10, fact is recalled.
#[tokio::test]
async fn ten_round_window_scenario() {
    let h = harness(10);
    let store = h.orchestrator.short_term();
    for round in 1..=22 {
        h.orchestrator
            .run_turn("s1", &format!("small talk {round}"))
            .await
            .expect("turn");
        let context = store.get_context("s1").await.expect("context");
        assert_eq!(context.total_rounds, round);
        assert_eq!(context.recent.len(), round.min(10) * 2);
        assert_eq!(context.summary_text().is_some(), round >= 11);
        assert_eq!(
            context.recent[0].content,
            format!("small talk {}", round.saturating_sub(10) + 1)
        );
    }

    let outcome = h
        .orchestrator
        .run_turn("s1", "please remember: user works 5 years")
        .await
        .expect("turn");
    let fact_id = outcome.stored_fact_id.expect("fact stored");

    let records = h
        .orchestrator
        .recall("how many years has the user worked")
        .await
        .expect("recall");
    assert!(records.len() <= 5);
    let hit = records
        .iter()
        .find(|record| record.id == fact_id)
        .expect("fact in top 5");
    assert_eq!(hit.content, "user works 5 years");
}

/// Persist cues strip their prefix and tag the record with turn metadata.
#[tokio::test]
async fn fact_is_stored_and_recalled_across_sessions() {
    let h = harness(4);
    let outcome = h
        .orchestrator
        .run_turn("s1", "请记住：我的工作年限是 5 年")
        .await
        .expect("turn");
    assert!(outcome.is_clean());
    let fact_id = outcome.stored_fact_id.expect("fact");

    let outcome = h
        .orchestrator
        .run_turn("s2", "我的工作年限是多少？")
        .await
        .expect("turn");
    let record = outcome
        .recalled
        .iter()
        .find(|record| record.id == fact_id)
        .expect("recalled in another session");
    assert_eq!(record.content, "我的工作年限是 5 年");
    assert_eq!(record.metadata["session_id"], "s1");
    assert_eq!(record.metadata["kind"], "user_fact");
    assert!(record.metadata["timestamp"].is_i64());

    let prompt = h.answers.last_prompt().expect("prompt");
    assert!(prompt[1].content.contains("1. 我的工作年限是 5 年"));
}

/// Queries without a recall cue never touch long-term memory.
#[tokio::test]
async fn uncued_query_skips_long_term() {
    let h = harness_with(
        4,
        Arc::new(InMemoryKeyValue::new()),
        Arc::new(FailingSearchIndex::new()),
        Arc::new(HashingEmbedder::default()),
    );
    let outcome = h
        .orchestrator
        .run_turn("s1", "what is the weather")
        .await
        .expect("turn");
    assert!(outcome.is_clean());
}

/// Long-term read and write failures degrade the turn without failing it.
#[tokio::test]
async fn long_term_failures_are_warnings() {
    let h = harness_with(
        4,
        Arc::new(InMemoryKeyValue::new()),
        Arc::new(FailingSearchIndex::new()),
        Arc::new(HashingEmbedder::default()),
    );
    let outcome = h
        .orchestrator
        .run_turn("s1", "please remember my name is Ada")
        .await
        .expect("turn");
    assert_eq!(outcome.response, "ok");
    assert_eq!(outcome.recalled, Vec::new());
    assert_eq!(outcome.stored_fact_id, None);
    assert_eq!(outcome.warnings.len(), 2);
    assert!(matches!(outcome.warnings[0], TurnWarning::RecallFailed(_)));
    assert!(matches!(outcome.warnings[1], TurnWarning::FactWriteFailed(_)));

    let context = h
        .orchestrator
        .short_term()
        .get_context("s1")
        .await
        .expect("context");
    assert_eq!(context.total_rounds, 1);
}

/// An unavailable embedder only costs the turn its long-term context.
#[tokio::test]
async fn embedding_failure_is_a_recall_warning() {
    let h = harness_with(
        4,
        Arc::new(InMemoryKeyValue::new()),
        Arc::new(InMemorySearchIndex::new()),
        Arc::new(FailingEmbedder::new("offline")),
    );
    let outcome = h
        .orchestrator
        .run_turn("s1", "what is my name")
        .await
        .expect("turn");
    assert_eq!(
        outcome.warnings,
        vec![TurnWarning::RecallFailed(
            MemoryError::EmbeddingFailed("embedding unavailable: offline".to_string()).to_string()
        )]
    );
}

/// A failed summary keeps the turn and is retried on the next eligible turn.
#[tokio::test]
async fn summarization_failure_is_retried_next_turn() {
    let summaries = EchoGenerator::new();
    let failing: Arc<dyn GenerationPort> = Arc::new(FailingGenerator::new("busy"));
    let build = |summary_generator: Arc<dyn GenerationPort>, kv: Arc<InMemoryKeyValue>| {
        Orchestrator::builder()
            .short_term(ShortTermStore::new(kv, 1))
            .long_term(LongTermStore::new(
                Arc::new(InMemorySearchIndex::new()),
                Arc::new(HashingEmbedder::default()),
                "facts",
                MemoryRecallOptions::default(),
            ))
            .generator(Arc::new(FixedGenerator::new("ok")))
            .summary_generator(summary_generator)
            .build()
            .expect("orchestrator")
    };
    let kv = Arc::new(InMemoryKeyValue::new());
    let orchestrator = build(failing, kv.clone());
    orchestrator.run_turn("s1", "one").await.expect("turn");
    let outcome = orchestrator.run_turn("s1", "two").await.expect("turn");
    assert_eq!(outcome.summary_refreshed, false);
    assert!(matches!(
        outcome.warnings.as_slice(),
        [TurnWarning::SummarizationFailed(_)]
    ));
    let context = orchestrator.short_term().get_context("s1").await.expect("context");
    assert_eq!(context.total_rounds, 2);
    assert_eq!(context.summary, None);

    let orchestrator = build(Arc::new(summaries.clone()), kv);
    let outcome = orchestrator.run_turn("s1", "three").await.expect("turn");
    assert!(outcome.summary_refreshed);
    let context = orchestrator.short_term().get_context("s1").await.expect("context");
    let summary = context.summary.expect("summary");
    assert_eq!(summary.covered_rounds, 2);
    assert!(summary.text.contains("user: one"));
    assert!(summary.text.contains("user: two"));
}

/// A blank summary is reported as a failure and the older summary survives.
#[tokio::test]
async fn blank_summary_keeps_previous_and_warns() {
    let build = |summary_generator: Arc<dyn GenerationPort>, kv: Arc<InMemoryKeyValue>| {
        Orchestrator::builder()
            .short_term(ShortTermStore::new(kv, 1))
            .long_term(LongTermStore::new(
                Arc::new(InMemorySearchIndex::new()),
                Arc::new(HashingEmbedder::default()),
                "facts",
                MemoryRecallOptions::default(),
            ))
            .generator(Arc::new(FixedGenerator::new("ok")))
            .summary_generator(summary_generator)
            .build()
            .expect("orchestrator")
    };
    let kv = Arc::new(InMemoryKeyValue::new());
    let orchestrator = build(Arc::new(EchoGenerator::new()), kv.clone());
    orchestrator.run_turn("s1", "one").await.expect("turn");
    let outcome = orchestrator.run_turn("s1", "two").await.expect("turn");
    assert!(outcome.summary_refreshed);

    let orchestrator = build(Arc::new(FixedGenerator::new("   ")), kv);
    let outcome = orchestrator.run_turn("s1", "three").await.expect("turn");
    assert_eq!(outcome.summary_refreshed, false);
    assert_eq!(
        outcome.warnings,
        vec![TurnWarning::SummarizationFailed(
            MemoryError::GenerationFailed("empty summary".to_string()).to_string()
        )]
    );
    let context = orchestrator.short_term().get_context("s1").await.expect("context");
    assert!(context.has_summary_gap());
    let summary = context.summary.expect("summary");
    assert_eq!(summary.covered_rounds, 1);
    assert!(summary.text.contains("user: one"));
}

/// Generation failure aborts the turn before anything is written.
#[tokio::test]
async fn generation_failure_is_fatal() {
    let orchestrator = Orchestrator::builder()
        .short_term(ShortTermStore::new(Arc::new(InMemoryKeyValue::new()), 2))
        .long_term(LongTermStore::new(
            Arc::new(InMemorySearchIndex::new()),
            Arc::new(HashingEmbedder::default()),
            "facts",
            MemoryRecallOptions::default(),
        ))
        .generator(Arc::new(FailingGenerator::new("down")))
        .build()
        .expect("orchestrator");
    let err = orchestrator.run_turn("s1", "hello").await.unwrap_err();
    assert!(matches!(
        err,
        MnemoCoreError::Generation(PortError::GenerationUnavailable(_))
    ));
    let context = orchestrator.short_term().get_context("s1").await.expect("context");
    assert_eq!(context.recent.len(), 0);
}

/// An unreachable short-term store aborts the turn.
#[tokio::test]
async fn short_term_failure_is_fatal() {
    let h = harness_with(
        2,
        Arc::new(UnavailableKeyValue::new()),
        Arc::new(InMemorySearchIndex::new()),
        Arc::new(HashingEmbedder::default()),
    );
    let err = h.orchestrator.run_turn("s1", "hello").await.unwrap_err();
    assert!(matches!(
        err,
        MnemoCoreError::Memory(MemoryError::StoreUnavailable(_))
    ));
    assert_eq!(h.answers.prompts().len(), 0);
    assert!(h.orchestrator.prepare().await.is_err());
}

/// A dangling user message from an interrupted turn is carried into the next prompt.
#[tokio::test]
async fn odd_length_log_is_tolerated() {
    let h = harness(2);
    let store = h.orchestrator.short_term();
    store
        .append_message("s1", Role::User, "interrupted question")
        .await
        .expect("append");
    let outcome = h.orchestrator.run_turn("s1", "next").await.expect("turn");
    assert_eq!(outcome.response, "ok");
    let context = store.get_context("s1").await.expect("context");
    assert_eq!(context.recent.len(), 3);
    assert_eq!(context.recent[0].content, "interrupted question");

    let prompt = h.answers.last_prompt().expect("prompt");
    assert!(prompt[1].content.contains("user: interrupted question"));
}

/// Clearing a session makes it indistinguishable from one that never existed.
#[tokio::test]
async fn clear_session_is_idempotent() {
    let h = harness(1);
    for query in ["a", "b", "c"] {
        h.orchestrator.run_turn("s1", query).await.expect("turn");
    }
    h.orchestrator.clear_session("s1").await.expect("clear");
    h.orchestrator.clear_session("s1").await.expect("clear again");
    let store = h.orchestrator.short_term();
    assert_eq!(
        store.get_context("s1").await.expect("cleared"),
        store.get_context("never").await.expect("never")
    );
    assert_eq!(store.get_access_time("s1").await.expect("time"), None);
    assert_eq!(store.summary("s1").await.expect("summary"), None);
}

/// Index teardown removes every fact and is a no-op the second time.
#[tokio::test]
async fn reset_long_term_drops_facts() {
    let h = harness(2);
    h.orchestrator
        .remember("s1", "likes green tea")
        .await
        .expect("remember");
    assert_eq!(h.orchestrator.recall("green tea").await.expect("recall").len(), 1);
    assert_eq!(h.orchestrator.reset_long_term().await.expect("reset"), true);
    assert_eq!(h.orchestrator.recall("green tea").await.expect("recall"), Vec::new());
    assert_eq!(h.orchestrator.reset_long_term().await.expect("reset"), false);
}

/// Config-built orchestrators persist to SQLite and reopen with their history.
#[tokio::test]
async fn config_with_sqlite_backends_survives_restart() {
    let temp = tempdir().expect("tempdir");
    let endpoint = format!("sqlite://{}", temp.path().join("mnemo.sqlite").display());
    let config = MnemoConfig::builder()
        .window_size(2)
        .backends(BackendsConfig {
            backing_store_endpoint: endpoint.clone(),
            search_store_endpoint: endpoint,
            search_index: "facts".to_string(),
        })
        .build();
    let embedder: Arc<dyn EmbeddingPort> = Arc::new(HashingEmbedder::default());
    {
        let orchestrator = Orchestrator::from_config(
            &config,
            embedder.clone(),
            Arc::new(FixedGenerator::new("ok")),
        )
        .expect("orchestrator");
        orchestrator.prepare().await.expect("prepare");
        orchestrator
            .run_turn("s1", "please remember: the user is called Ada")
            .await
            .expect("turn");
    }

    let orchestrator =
        Orchestrator::from_config(&config, embedder, Arc::new(FixedGenerator::new("ok")))
            .expect("orchestrator");
    let context = orchestrator.short_term().get_context("s1").await.expect("context");
    assert_eq!(context.total_rounds, 1);
    let outcome = orchestrator
        .run_turn("s2", "what is my name")
        .await
        .expect("turn");
    assert_eq!(outcome.recalled.len(), 1);
    assert_eq!(outcome.recalled[0].content, "the user is called Ada");
}

/// Unknown endpoint schemes are rejected at construction.
#[test]
fn unsupported_endpoint_is_rejected() {
    let config = MnemoConfig::builder()
        .backends(BackendsConfig {
            backing_store_endpoint: "redis://localhost:6379".to_string(),
            ..BackendsConfig::default()
        })
        .build();
    let err = Orchestrator::from_config(
        &config,
        Arc::new(HashingEmbedder::default()),
        Arc::new(FixedGenerator::new("ok")),
    )
    .unwrap_err();
    assert!(matches!(err, MnemoCoreError::UnsupportedEndpoint(_)));
}

/// A single autoagents provider can drive both ports.
#[tokio::test]
async fn provider_backed_orchestrator_answers() {
    let llm: Arc<dyn LLMProvider> = Arc::new(FixedLLM::new("mock response"));
    let orchestrator =
        Orchestrator::from_provider(&MnemoConfig::default(), llm).expect("orchestrator");
    let outcome = orchestrator.run_turn("s1", "hello").await.expect("turn");
    assert_eq!(outcome.response, "mock response");
}
