//! Integration tests for the migration run pipeline.
//!
//! These tests drive the runner end-to-end against the in-memory adapters,
//! verifying that:
//! - Pending units are applied in ascending id order and recorded
//! - Re-running is a no-op that leaves the ledger unchanged
//! - A failing unit halts the run with a precise partial report
//! - Rollback reverts the most recent units in descending order
//! - A racing runner's duplicate ledger insert is tolerated
//! - Cancellation takes effect between units, never mid-unit
//! - Topology units materialize the full derived topic set

use std::sync::Arc;

use async_trait::async_trait;
use groundwork_adapters::broker::BrokerAdmin;
use groundwork_adapters::store::{DocumentStore, IndexOptions, KeySpec};
use groundwork_adapters::{MemoryBroker, MemoryStore};
use groundwork_core::{GroundworkError, GroundworkResult};
use groundwork_migrations::ledger::{AppliedRecord, AppliedTracker, LedgerStore, MemoryLedger};
use groundwork_migrations::migration::{MigrationId, MigrationUnit, TargetKind};
use groundwork_migrations::registry::MigrationRegistry;
use groundwork_migrations::runner::{CancelToken, MigrationRunner, RunOutcome};
use groundwork_migrations::units::{CreateIndex, EnsureTopology};
use groundwork_topology::{ConsumerRetryPolicy, TopicSpec};

fn index_unit(stamp: i64, slug: &str, collection: &str, field: &str, index_name: &str) -> Arc<CreateIndex> {
    Arc::new(CreateIndex::new(
        MigrationId::new(stamp, slug),
        collection,
        KeySpec::ascending(field),
        IndexOptions::named(index_name).unique(),
    ))
}

/// A unit whose `up` always fails with an adapter-level error.
struct FailingUnit {
    id: MigrationId,
}

#[async_trait]
impl MigrationUnit<dyn DocumentStore> for FailingUnit {
    fn id(&self) -> &MigrationId {
        &self.id
    }

    fn describe(&self) -> String {
        format!("always-failing unit {}", self.id)
    }

    async fn up(&self, _store: &dyn DocumentStore) -> GroundworkResult<()> {
        Err(GroundworkError::IndexCreate("simulated failure".into()))
    }

    async fn down(&self, _store: &dyn DocumentStore) -> GroundworkResult<()> {
        Ok(())
    }
}

/// A unit that sneaks its own ledger record in during `up`, simulating a
/// racing runner process finishing first.
struct RacingUnit {
    id: MigrationId,
    ledger: Arc<MemoryLedger>,
}

#[async_trait]
impl MigrationUnit<dyn DocumentStore> for RacingUnit {
    fn id(&self) -> &MigrationId {
        &self.id
    }

    fn describe(&self) -> String {
        format!("racing unit {}", self.id)
    }

    async fn up(&self, _store: &dyn DocumentStore) -> GroundworkResult<()> {
        self.ledger
            .insert(&AppliedRecord::new(
                self.id.clone(),
                TargetKind::DocumentStore,
                chrono::Utc::now(),
            ))
            .await
    }

    async fn down(&self, _store: &dyn DocumentStore) -> GroundworkResult<()> {
        Ok(())
    }
}

/// A unit that requests cancellation from inside its own `up`.
struct CancellingUnit {
    id: MigrationId,
    token: CancelToken,
}

#[async_trait]
impl MigrationUnit<dyn DocumentStore> for CancellingUnit {
    fn id(&self) -> &MigrationId {
        &self.id
    }

    fn describe(&self) -> String {
        format!("cancelling unit {}", self.id)
    }

    async fn up(&self, _store: &dyn DocumentStore) -> GroundworkResult<()> {
        self.token.cancel();
        Ok(())
    }

    async fn down(&self, _store: &dyn DocumentStore) -> GroundworkResult<()> {
        Ok(())
    }
}

fn doc_tracker(ledger: &Arc<MemoryLedger>) -> AppliedTracker {
    AppliedTracker::new(TargetKind::DocumentStore, Arc::clone(ledger))
}

async fn connected_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.connect().await.unwrap();
    store
}

// ── 1. Ordered application and recording ────────────────────────────────

#[tokio::test]
async fn test_up_applies_pending_in_id_order() {
    let store = connected_store().await;
    let ledger = Arc::new(MemoryLedger::new());

    // Registered out of order on purpose.
    let mut registry: MigrationRegistry<dyn DocumentStore> =
        MigrationRegistry::new(TargetKind::DocumentStore);
    registry
        .register(index_unit(3, "userkeys-userid", "userKeys", "userId", "idx-userKeys-userId-unique"))
        .unwrap();
    registry
        .register(index_unit(1, "users-username", "users", "userName", "idx-users-username-unique"))
        .unwrap();
    registry
        .register(index_unit(2, "users-authid", "users", "authId", "idx-users-authId-unique"))
        .unwrap();

    let runner = MigrationRunner::new(registry, doc_tracker(&ledger));
    let report = runner.up(&store).await.unwrap();

    assert!(report.succeeded());
    let stamps: Vec<i64> = report.applied.iter().map(MigrationId::stamp).collect();
    assert_eq!(stamps, vec![1, 2, 3]);
    assert_eq!(ledger.len(), 3);
    assert_eq!(
        store.index_names("users"),
        vec!["idx-users-authId-unique", "idx-users-username-unique"]
    );
}

// ── 2. Idempotent re-run ────────────────────────────────────────────────

#[tokio::test]
async fn test_up_twice_is_noop_second_time() {
    let store = connected_store().await;
    let ledger = Arc::new(MemoryLedger::new());

    let mut registry: MigrationRegistry<dyn DocumentStore> =
        MigrationRegistry::new(TargetKind::DocumentStore);
    registry
        .register(index_unit(1, "users-username", "users", "userName", "idx-users-username-unique"))
        .unwrap();

    let runner = MigrationRunner::new(registry, doc_tracker(&ledger));
    let first = runner.up(&store).await.unwrap();
    assert_eq!(first.applied.len(), 1);

    let second = runner.up(&store).await.unwrap();
    assert!(second.succeeded());
    assert!(second.applied.is_empty());
    assert_eq!(ledger.len(), 1);
    assert_eq!(store.index_names("users").len(), 1);
}

// ── 3. Partial failure halts the run ────────────────────────────────────

#[tokio::test]
async fn test_up_halts_at_first_failure() {
    let store = connected_store().await;
    let ledger = Arc::new(MemoryLedger::new());

    let mut registry: MigrationRegistry<dyn DocumentStore> =
        MigrationRegistry::new(TargetKind::DocumentStore);
    registry
        .register(index_unit(1, "a", "users", "userName", "idx-a"))
        .unwrap();
    registry
        .register(Arc::new(FailingUnit {
            id: MigrationId::new(2, "b"),
        }))
        .unwrap();
    registry
        .register(index_unit(3, "c", "users", "authId", "idx-c"))
        .unwrap();

    let runner = MigrationRunner::new(registry, doc_tracker(&ledger));
    let report = runner.up(&store).await.unwrap();

    assert!(!report.succeeded());
    let stamps: Vec<i64> = report.applied.iter().map(MigrationId::stamp).collect();
    assert_eq!(stamps, vec![1]);
    assert_eq!(report.failing().unwrap(), &MigrationId::new(2, "b"));
    match &report.outcome {
        RunOutcome::Failed { cause, .. } => {
            assert!(matches!(cause, GroundworkError::IndexCreate(_)));
        }
        other => panic!("expected failure, got {other:?}"),
    }

    // A is recorded, B got no partial credit, C was never attempted.
    assert_eq!(ledger.len(), 1);
    assert_eq!(store.index_names("users"), vec!["idx-a"]);
}

// ── 4. Rollback ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_down_reverts_most_recent_units() {
    let store = connected_store().await;
    let ledger = Arc::new(MemoryLedger::new());

    let mut registry: MigrationRegistry<dyn DocumentStore> =
        MigrationRegistry::new(TargetKind::DocumentStore);
    registry
        .register(index_unit(1, "a", "users", "userName", "idx-a"))
        .unwrap();
    registry
        .register(index_unit(2, "b", "users", "authId", "idx-b"))
        .unwrap();
    registry
        .register(index_unit(3, "c", "userKeys", "userId", "idx-c"))
        .unwrap();

    let runner = MigrationRunner::new(registry, doc_tracker(&ledger));
    runner.up(&store).await.unwrap();
    assert_eq!(ledger.len(), 3);

    let report = runner.down(&store, 2).await.unwrap();
    assert!(report.succeeded());
    let stamps: Vec<i64> = report.applied.iter().map(MigrationId::stamp).collect();
    assert_eq!(stamps, vec![3, 2]);
    assert_eq!(ledger.len(), 1);
    assert_eq!(store.index_names("users"), vec!["idx-a"]);
    assert!(store.index_names("userKeys").is_empty());
}

#[tokio::test]
async fn test_down_count_beyond_applied_reverts_all() {
    let store = connected_store().await;
    let ledger = Arc::new(MemoryLedger::new());

    let mut registry: MigrationRegistry<dyn DocumentStore> =
        MigrationRegistry::new(TargetKind::DocumentStore);
    registry
        .register(index_unit(1, "a", "users", "userName", "idx-a"))
        .unwrap();

    let runner = MigrationRunner::new(registry, doc_tracker(&ledger));
    runner.up(&store).await.unwrap();

    let report = runner.down(&store, 10).await.unwrap();
    assert!(report.succeeded());
    assert_eq!(report.applied.len(), 1);
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn test_down_with_nothing_applied_is_noop() {
    let store = connected_store().await;
    let ledger = Arc::new(MemoryLedger::new());

    let mut registry: MigrationRegistry<dyn DocumentStore> =
        MigrationRegistry::new(TargetKind::DocumentStore);
    registry
        .register(index_unit(1, "a", "users", "userName", "idx-a"))
        .unwrap();

    let runner = MigrationRunner::new(registry, doc_tracker(&ledger));
    let report = runner.down(&store, 1).await.unwrap();
    assert!(report.succeeded());
    assert!(report.applied.is_empty());
}

#[tokio::test]
async fn test_down_fails_for_unregistered_ledger_entry() {
    let store = connected_store().await;
    let ledger = Arc::new(MemoryLedger::new());
    ledger
        .insert(&AppliedRecord::new(
            MigrationId::new(9, "ghost"),
            TargetKind::DocumentStore,
            chrono::Utc::now(),
        ))
        .await
        .unwrap();

    let registry: MigrationRegistry<dyn DocumentStore> =
        MigrationRegistry::new(TargetKind::DocumentStore);
    let runner = MigrationRunner::new(registry, doc_tracker(&ledger));
    let result = runner.down(&store, 1).await;
    assert!(matches!(result, Err(GroundworkError::Configuration(_))));
}

// ── 5. Up/down round trip ───────────────────────────────────────────────

#[tokio::test]
async fn test_round_trip_restores_store_state() {
    let store = connected_store().await;
    let ledger = Arc::new(MemoryLedger::new());

    let mut registry: MigrationRegistry<dyn DocumentStore> =
        MigrationRegistry::new(TargetKind::DocumentStore);
    registry
        .register(index_unit(
            1659280383465,
            "users-username",
            "users",
            "userName",
            "idx-users-username-unique",
        ))
        .unwrap();

    let runner = MigrationRunner::new(registry, doc_tracker(&ledger));
    assert_eq!(runner.registry().len(), 1);

    let id = MigrationId::new(1659280383465, "users-username");
    runner.up(&store).await.unwrap();
    assert!(runner.tracker().is_applied(&id).await.unwrap());

    runner.down(&store, 1).await.unwrap();
    assert!(!runner.tracker().is_applied(&id).await.unwrap());
    assert!(store.index_names("users").is_empty());
    assert!(ledger.is_empty());

    // The same unit can be applied again after a full round trip.
    let report = runner.up(&store).await.unwrap();
    assert_eq!(report.applied.len(), 1);
}

// ── 6. Racing runners ───────────────────────────────────────────────────

#[tokio::test]
async fn test_duplicate_apply_from_racing_runner_is_tolerated() {
    let store = connected_store().await;
    let ledger = Arc::new(MemoryLedger::new());

    let mut registry: MigrationRegistry<dyn DocumentStore> =
        MigrationRegistry::new(TargetKind::DocumentStore);
    registry
        .register(Arc::new(RacingUnit {
            id: MigrationId::new(1, "raced"),
            ledger: Arc::clone(&ledger),
        }))
        .unwrap();
    registry
        .register(index_unit(2, "b", "users", "authId", "idx-b"))
        .unwrap();

    let runner = MigrationRunner::new(registry, doc_tracker(&ledger));
    let report = runner.up(&store).await.unwrap();

    // The duplicate insert is logged and the run continues to completion.
    assert!(report.succeeded());
    assert_eq!(report.applied.len(), 2);
    assert_eq!(ledger.len(), 2);
}

// ── 7. Cancellation ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_cancellation_takes_effect_between_units() {
    let store = connected_store().await;
    let ledger = Arc::new(MemoryLedger::new());
    let token = CancelToken::new();

    let mut registry: MigrationRegistry<dyn DocumentStore> =
        MigrationRegistry::new(TargetKind::DocumentStore);
    registry
        .register(Arc::new(CancellingUnit {
            id: MigrationId::new(1, "cancels-run"),
            token: token.clone(),
        }))
        .unwrap();
    registry
        .register(index_unit(2, "never-runs", "users", "authId", "idx-never"))
        .unwrap();

    let runner = MigrationRunner::new(registry, doc_tracker(&ledger)).with_cancel_token(token);
    let report = runner.up(&store).await.unwrap();

    assert!(matches!(report.outcome, RunOutcome::Cancelled));
    // The in-flight unit ran to completion and was recorded; the next
    // unit was never attempted.
    assert_eq!(report.applied.len(), 1);
    assert_eq!(ledger.len(), 1);
    assert!(store.index_names("users").is_empty());
}

#[tokio::test]
async fn test_pre_cancelled_run_applies_nothing() {
    let store = connected_store().await;
    let ledger = Arc::new(MemoryLedger::new());
    let token = CancelToken::new();
    token.cancel();

    let mut registry: MigrationRegistry<dyn DocumentStore> =
        MigrationRegistry::new(TargetKind::DocumentStore);
    registry
        .register(index_unit(1, "a", "users", "userName", "idx-a"))
        .unwrap();

    let runner = MigrationRunner::new(registry, doc_tracker(&ledger)).with_cancel_token(token);
    let report = runner.up(&store).await.unwrap();

    assert!(matches!(report.outcome, RunOutcome::Cancelled));
    assert!(report.applied.is_empty());
    assert!(ledger.is_empty());
}

// ── 8. Topology runs ────────────────────────────────────────────────────

#[tokio::test]
async fn test_topology_run_materializes_derived_topics() {
    let broker = MemoryBroker::new();
    broker.connect().await.unwrap();
    let ledger = Arc::new(MemoryLedger::new());

    let spec = TopicSpec::new("user-change-1", 6, 2)
        .with_consumer(ConsumerRetryPolicy::new("note-service", 4))
        .with_consumer(ConsumerRetryPolicy::new("key-service", 4));

    let mut registry: MigrationRegistry<dyn BrokerAdmin> =
        MigrationRegistry::new(TargetKind::BrokerTopology);
    registry
        .register(Arc::new(EnsureTopology::new(
            MigrationId::new(1667755200000, "create-user-change-topics"),
            spec,
        )))
        .unwrap();

    let tracker = AppliedTracker::new(TargetKind::BrokerTopology, Arc::clone(&ledger));
    let runner = MigrationRunner::new(registry, tracker);

    let report = runner.up(&broker).await.unwrap();
    assert!(report.succeeded());
    assert_eq!(broker.topic_count(), 11);
    assert!(broker.topic_exists("user-change-1").await.unwrap());
    assert!(broker
        .topic_exists("user-change-1-note-service-retry-4")
        .await
        .unwrap());
    assert!(broker
        .topic_exists("user-change-1-key-service-dead-letter")
        .await
        .unwrap());

    // Second run plans nothing; the broker is untouched.
    let second = runner.up(&broker).await.unwrap();
    assert!(second.applied.is_empty());
    assert_eq!(broker.topic_count(), 11);
}

#[tokio::test]
async fn test_topology_run_fills_partially_created_broker() {
    let broker = MemoryBroker::new();
    broker.connect().await.unwrap();
    // A previous deployment half-finished: the base topic exists already.
    broker
        .create_topics(
            &[groundwork_topology::TopicDescriptor::new("user-change-1", 6, 2)],
            &groundwork_adapters::CreateTopicsOptions::default(),
        )
        .await
        .unwrap();

    let ledger = Arc::new(MemoryLedger::new());
    let spec = TopicSpec::new("user-change-1", 6, 2)
        .with_consumer(ConsumerRetryPolicy::new("note-service", 4));

    let mut registry: MigrationRegistry<dyn BrokerAdmin> =
        MigrationRegistry::new(TargetKind::BrokerTopology);
    registry
        .register(Arc::new(EnsureTopology::new(
            MigrationId::new(1667755200000, "create-user-change-topics"),
            spec,
        )))
        .unwrap();

    let tracker = AppliedTracker::new(TargetKind::BrokerTopology, Arc::clone(&ledger));
    let runner = MigrationRunner::new(registry, tracker);

    let report = runner.up(&broker).await.unwrap();
    assert!(report.succeeded());
    assert_eq!(broker.topic_count(), 6);
}
