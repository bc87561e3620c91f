//! Reconciliation engine behavior against a scripted provider.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MemoryStore, MockProvider};
use souk_core::Role;
use souk_sync::{
    EngineConfig, ReconciliationEngine, ResolverConfig, SyncError, SyncOutcome,
};

fn engine_with(
    provider: Arc<MockProvider>,
    store: Arc<MemoryStore>,
) -> ReconciliationEngine {
    ReconciliationEngine::new(
        provider,
        store,
        EngineConfig {
            settle_delay: Duration::ZERO,
        },
        ResolverConfig {
            retry_delay: Duration::ZERO,
        },
    )
}

fn completed(outcome: SyncOutcome) -> souk_sync::SyncSummary {
    match outcome {
        SyncOutcome::Completed(summary) => summary,
        SyncOutcome::AlreadyRunning => panic!("pass did not run"),
    }
}

#[tokio::test]
async fn test_first_pass_mirrors_every_user() {
    let provider = Arc::new(MockProvider::new());
    provider.add_user("p1", "alice", "alice@example.com", "Alice", "Vance");
    provider.add_user("p2", "bob", "bob@example.com", "Bob", "Stone");
    provider.add_user("p3", "carol", "carol@example.com", "Carol", "Reed");
    provider.set_effective("p1", &["ADMIN"]);
    provider.set_effective("p2", &["MERCHANT"]);

    let store = Arc::new(MemoryStore::new());
    let engine = engine_with(provider, Arc::clone(&store));

    let summary = completed(engine.synchronize().await.unwrap());
    assert_eq!(summary.scanned, 3);
    assert_eq!(summary.created, 3);
    assert_eq!(summary.failed, 0);

    assert_eq!(store.get_by_username("alice").unwrap().role, Role::Admin);
    assert_eq!(store.get_by_username("bob").unwrap().role, Role::Merchant);
    // No role evidence anywhere degrades to the floor.
    assert_eq!(store.get_by_username("carol").unwrap().role, Role::Customer);
}

#[tokio::test]
async fn test_second_pass_issues_no_writes() {
    let provider = Arc::new(MockProvider::new());
    provider.add_user("p1", "alice", "alice@example.com", "Alice", "Vance");
    provider.add_user("p2", "bob", "bob@example.com", "Bob", "Stone");
    provider.set_effective("p1", &["ADMIN"]);
    provider.set_effective("p2", &["MERCHANT"]);

    let store = Arc::new(MemoryStore::new());
    let engine = engine_with(provider, Arc::clone(&store));

    completed(engine.synchronize().await.unwrap());
    store.reset_counters();

    let summary = completed(engine.synchronize().await.unwrap());
    assert_eq!(summary.unchanged, 2);
    assert_eq!(summary.created + summary.updated + summary.deleted, 0);
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_pass_converges_on_upstream_changes() {
    let provider = Arc::new(MockProvider::new());
    provider.add_user("p1", "alice", "alice@example.com", "Alice", "Vance");
    provider.add_user("p2", "bob", "bob@example.com", "Bob", "Stone");

    let store = Arc::new(MemoryStore::new());
    let engine = engine_with(Arc::clone(&provider), Arc::clone(&store));
    completed(engine.synchronize().await.unwrap());

    // Drift upstream: one edited, one removed, one new.
    provider.set_email("p1", "alice@souk.example");
    provider.remove_user("p2");
    provider.add_user("p3", "carol", "carol@example.com", "Carol", "Reed");

    let summary = completed(engine.synchronize().await.unwrap());
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.created, 1);

    assert_eq!(
        store.get_by_username("alice").unwrap().email,
        "alice@souk.example"
    );
    assert!(store.get_by_username("bob").is_none());
    assert!(store.get_by_username("carol").is_some());
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_admin_wins_over_merchant_regardless_of_order() {
    let provider = Arc::new(MockProvider::new());
    provider.add_user("p1", "alice", "alice@example.com", "Alice", "Vance");
    provider.set_effective("p1", &["MERCHANT", "ADMIN", "offline_access"]);

    let store = Arc::new(MemoryStore::new());
    let engine = engine_with(provider, Arc::clone(&store));
    completed(engine.synchronize().await.unwrap());

    assert_eq!(store.get_by_username("alice").unwrap().role, Role::Admin);
}

#[tokio::test]
async fn test_retry_sees_late_role_grant() {
    let provider = Arc::new(MockProvider::new());
    provider.add_user("p1", "bob", "bob@example.com", "Bob", "Stone");
    // First attempt sees nothing; the grant lands before the retry.
    provider.script_effective("p1", vec![vec![], vec!["MERCHANT".to_string()]]);

    let store = Arc::new(MemoryStore::new());
    let engine = engine_with(provider, Arc::clone(&store));
    completed(engine.synchronize().await.unwrap());

    assert_eq!(store.get_by_username("bob").unwrap().role, Role::Merchant);
}

#[tokio::test]
async fn test_group_signal_fallback() {
    let provider = Arc::new(MockProvider::new());
    provider.add_user("p1", "alice", "alice@example.com", "Alice", "Vance");
    provider.set_groups("p1", &["/marketplace/admins"]);

    let store = Arc::new(MemoryStore::new());
    let engine = engine_with(provider, Arc::clone(&store));
    completed(engine.synchronize().await.unwrap());

    assert_eq!(store.get_by_username("alice").unwrap().role, Role::Admin);
}

#[tokio::test]
async fn test_one_bad_record_does_not_stop_the_pass() {
    let provider = Arc::new(MockProvider::new());
    provider.add_user("p1", "alice", "alice@example.com", "Alice", "Vance");
    provider.add_user("p2", "bob", "bob@example.com", "Bob", "Stone");
    provider.add_user("p3", "carol", "carol@example.com", "Carol", "Reed");

    let store = Arc::new(MemoryStore::new());
    store.fail_saves_for("bob");
    let engine = engine_with(provider, Arc::clone(&store));

    let summary = completed(engine.synchronize().await.unwrap());
    assert_eq!(summary.created, 2);
    assert_eq!(summary.failed, 1);
    assert!(store.get_by_username("alice").is_some());
    assert!(store.get_by_username("bob").is_none());
    assert!(store.get_by_username("carol").is_some());

    // Once the conflict clears, the next pass picks the record up.
    store.clear_failures();
    let summary = completed(engine.synchronize().await.unwrap());
    assert_eq!(summary.created, 1);
    assert_eq!(summary.failed, 0);
    assert!(store.get_by_username("bob").is_some());
}

#[tokio::test]
async fn test_provider_outage_aborts_without_local_mutation() {
    let provider = Arc::new(MockProvider::new());
    provider.add_user("p1", "alice", "alice@example.com", "Alice", "Vance");

    let store = Arc::new(MemoryStore::new());
    let engine = engine_with(Arc::clone(&provider), Arc::clone(&store));
    completed(engine.synchronize().await.unwrap());
    store.reset_counters();

    provider.set_unavailable(true);
    let error = engine.synchronize().await.unwrap_err();
    assert!(matches!(error, SyncError::Provider(_)));
    assert_eq!(store.writes(), 0);
    assert_eq!(store.len(), 1);

    // And the guard was released: the next pass runs.
    provider.set_unavailable(false);
    let summary = completed(engine.synchronize().await.unwrap());
    assert_eq!(summary.unchanged, 1);
}

#[tokio::test]
async fn test_concurrent_pass_is_a_noop() {
    let mut provider = MockProvider::new();
    provider.list_delay = Duration::from_millis(50);
    provider.add_user("p1", "alice", "alice@example.com", "Alice", "Vance");
    let provider = Arc::new(provider);

    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(engine_with(provider, Arc::clone(&store)));

    let second = Arc::clone(&engine);
    let (first, second) = tokio::join!(engine.synchronize(), async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        second.synchronize().await
    });

    assert!(matches!(first.unwrap(), SyncOutcome::Completed(_)));
    assert_eq!(second.unwrap(), SyncOutcome::AlreadyRunning);
    assert_eq!(store.len(), 1);
}
