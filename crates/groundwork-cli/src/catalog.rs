//! The production migration catalog.
//!
//! Every migration this deployment ships is registered here, at build time,
//! with its original creation stamp. The registries are rebuilt on each
//! command invocation; registration fails fast on a duplicate id, so a
//! broken catalog never reaches the runner.

use std::sync::Arc;

use groundwork_adapters::{BrokerAdmin, CreateTopicsOptions, DocumentStore, IndexOptions, KeySpec};
use groundwork_core::GroundworkResult;
use groundwork_migrations::units::{CreateIndex, EnsureTopology};
use groundwork_migrations::{MigrationId, MigrationRegistry, TargetKind};
use groundwork_topology::{ConsumerRetryPolicy, TopicSpec};

/// Builds the registry of document store schema migrations.
pub fn document_store_registry() -> GroundworkResult<MigrationRegistry<dyn DocumentStore>> {
    let mut registry: MigrationRegistry<dyn DocumentStore> =
        MigrationRegistry::new(TargetKind::DocumentStore);

    registry.register(Arc::new(CreateIndex::new(
        MigrationId::new(1659279640978, "add-users-authid-unique-index"),
        "users",
        KeySpec::ascending("authId"),
        IndexOptions::named("idx-users-authId-unique").unique(),
    )))?;

    registry.register(Arc::new(CreateIndex::new(
        MigrationId::new(1659280383465, "add-users-username-unique-index"),
        "users",
        KeySpec::ascending("userName"),
        IndexOptions::named("idx-users-username-unique").unique(),
    )))?;

    registry.register(Arc::new(CreateIndex::new(
        MigrationId::new(1664696511965, "add-userkeys-userid-unique-index"),
        "userKeys",
        KeySpec::ascending("userId"),
        IndexOptions::named("idx-userKeys-userId-unique").unique(),
    )))?;

    Ok(registry)
}

/// The user-change event flow: two consumer services, four retry tiers each.
///
/// Each consumer drains its own retry chain at a decreasing cadence and
/// finally parks unprocessable events in its own dead-letter topic, so a
/// backlog in one service never blocks the other.
pub fn user_change_topic_spec() -> TopicSpec {
    TopicSpec::new("user-change-1", 6, 2)
        .with_consumer(ConsumerRetryPolicy::new("note-service", 4))
        .with_consumer(ConsumerRetryPolicy::new("key-service", 4))
}

/// Builds the registry of broker topology migrations.
///
/// The create options (per-call timeout, leader wait) come from the caller:
/// the engine does not own timeouts, the launcher's configuration does.
pub fn broker_topology_registry(
    options: &CreateTopicsOptions,
) -> GroundworkResult<MigrationRegistry<dyn BrokerAdmin>> {
    let mut registry: MigrationRegistry<dyn BrokerAdmin> =
        MigrationRegistry::new(TargetKind::BrokerTopology);

    registry.register(Arc::new(
        EnsureTopology::new(
            MigrationId::new(1667755200000, "create-user-change-topics"),
            user_change_topic_spec(),
        )
        .with_options(options.clone()),
    ))?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwork_topology::derive_topology;

    #[test]
    fn test_document_store_catalog_is_ordered() {
        let registry = document_store_registry().unwrap();
        assert_eq!(registry.len(), 3);
        let stamps: Vec<i64> = registry.list().iter().map(|u| u.id().stamp()).collect();
        assert_eq!(stamps, vec![1659279640978, 1659280383465, 1664696511965]);
    }

    #[test]
    fn test_broker_catalog_builds() {
        let registry = broker_topology_registry(&CreateTopicsOptions::default()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.kind(), TargetKind::BrokerTopology);
    }

    #[test]
    fn test_user_change_spec_derives_eleven_topics() {
        let topology = derive_topology(&user_change_topic_spec()).unwrap();
        assert_eq!(topology.len(), 11);
        assert_eq!(topology.topics()[0].name, "user-change-1");
        assert_eq!(topology.topics()[0].partitions, 6);
        assert_eq!(topology.topics()[0].replication_factor, 2);
    }
}
