//! Reusable migration units.
//!
//! Most migrations in practice are one of two shapes: create an index on a
//! document store collection, or materialize a topic topology on the
//! broker. These units cover both; bespoke units implement
//! [`MigrationUnit`](crate::migration::MigrationUnit) directly.

use async_trait::async_trait;
use groundwork_adapters::broker::{ensure_topics, BrokerAdmin, CreateTopicsOptions};
use groundwork_adapters::store::{ensure_index, DocumentStore, IndexOptions, KeySpec};
use groundwork_core::GroundworkResult;
use groundwork_topology::{derive_topology, TopicSpec};

use crate::migration::{MigrationId, MigrationUnit};

/// Creates a named index on a collection; `down` drops it.
///
/// `up` is idempotent through the adapter's existence check, so re-running
/// against a store that already has the index succeeds silently. `down`
/// drops exactly the named index and fails with
/// [`GroundworkError::IndexNotFound`](groundwork_core::GroundworkError::IndexNotFound)
/// if it is already gone.
pub struct CreateIndex {
    id: MigrationId,
    collection: String,
    keys: KeySpec,
    options: IndexOptions,
}

impl CreateIndex {
    /// Creates an index migration unit.
    pub fn new(
        id: MigrationId,
        collection: impl Into<String>,
        keys: KeySpec,
        options: IndexOptions,
    ) -> Self {
        Self {
            id,
            collection: collection.into(),
            keys,
            options,
        }
    }
}

#[async_trait]
impl MigrationUnit<dyn DocumentStore> for CreateIndex {
    fn id(&self) -> &MigrationId {
        &self.id
    }

    fn describe(&self) -> String {
        format!("create index {} on {}", self.options.name, self.collection)
    }

    async fn up(&self, store: &dyn DocumentStore) -> GroundworkResult<()> {
        let created = ensure_index(store, &self.collection, &self.keys, &self.options).await?;
        if created {
            tracing::info!(
                collection = %self.collection,
                index = %self.options.name,
                unique = self.options.unique,
                "created index"
            );
        }
        Ok(())
    }

    async fn down(&self, store: &dyn DocumentStore) -> GroundworkResult<()> {
        store.drop_index(&self.collection, &self.options.name).await?;
        tracing::info!(
            collection = %self.collection,
            index = %self.options.name,
            "dropped index"
        );
        Ok(())
    }
}

/// Materializes the derived topology of a [`TopicSpec`] on the broker.
///
/// `up` derives the full topic set (base, retry tiers, dead-letter) and
/// creates whatever is missing. `down` is a no-op: the admin capability
/// exposes no destructive topic operation, and rolling back a topology
/// must never delete topics that may hold live messages. Unmarking the
/// unit in the ledger is still meaningful: a later `up` re-ensures the
/// topology, which existing topics satisfy.
pub struct EnsureTopology {
    id: MigrationId,
    spec: TopicSpec,
    options: CreateTopicsOptions,
}

impl EnsureTopology {
    /// Creates a topology migration unit with default create options.
    pub fn new(id: MigrationId, spec: TopicSpec) -> Self {
        Self {
            id,
            spec,
            options: CreateTopicsOptions::default(),
        }
    }

    /// Overrides the topic creation options.
    #[must_use]
    pub fn with_options(mut self, options: CreateTopicsOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl MigrationUnit<dyn BrokerAdmin> for EnsureTopology {
    fn id(&self) -> &MigrationId {
        &self.id
    }

    fn describe(&self) -> String {
        format!(
            "ensure topology for {} ({} consumers)",
            self.spec.logical_name,
            self.spec.consumers.len()
        )
    }

    async fn up(&self, broker: &dyn BrokerAdmin) -> GroundworkResult<()> {
        let topology = derive_topology(&self.spec)?;
        let created = ensure_topics(broker, topology.topics(), &self.options).await?;
        tracing::info!(
            logical = %self.spec.logical_name,
            derived = topology.len(),
            created = created.len(),
            "ensured topic topology"
        );
        Ok(())
    }

    async fn down(&self, _broker: &dyn BrokerAdmin) -> GroundworkResult<()> {
        tracing::warn!(
            logical = %self.spec.logical_name,
            "rolling back topology unit leaves its topics in place"
        );
        Ok(())
    }
}
