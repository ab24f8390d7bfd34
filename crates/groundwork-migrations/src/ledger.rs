//! The applied-state ledger.
//!
//! The ledger is the durable record of which migration units have run. It
//! lives in an external store (a collection in the document store, one
//! record per applied unit) and is the sole source of truth: multiple
//! runner processes may race across deployments, so the [`AppliedTracker`]
//! keeps no cache and writes through on every call. The uniqueness
//! constraint behind [`LedgerStore::insert`] is the engine's only
//! concurrency-safety mechanism.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use groundwork_core::{GroundworkError, GroundworkResult};
use serde::{Deserialize, Serialize};

use crate::migration::{MigrationId, TargetKind};

/// One ledger record: a unit that has been applied.
///
/// Records are written exactly once and never mutated; a record disappears
/// only when an explicit `down` rollback of the same unit succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRecord {
    /// The applied unit's id.
    pub id: MigrationId,
    /// The target kind discriminator within the shared ledger collection.
    pub target: TargetKind,
    /// When the unit's `up` completed.
    pub applied_at: DateTime<Utc>,
}

impl AppliedRecord {
    /// Creates a record.
    pub const fn new(id: MigrationId, target: TargetKind, applied_at: DateTime<Utc>) -> Self {
        Self {
            id,
            target,
            applied_at,
        }
    }
}

/// The capability interface for ledger persistence.
///
/// Implementations wrap the external store holding the ledger collection.
/// `insert` must be an atomic insert-if-absent: when two runner processes
/// race, exactly one insert succeeds and the other observes
/// [`GroundworkError::DuplicateApply`].
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts a record if no record with the same id and target exists.
    ///
    /// Fails with [`GroundworkError::DuplicateApply`] if one does.
    async fn insert(&self, record: &AppliedRecord) -> GroundworkResult<()>;

    /// Removes the record for the given id and target.
    ///
    /// Fails with [`GroundworkError::NotApplied`] if there is none.
    async fn remove(&self, target: TargetKind, id: &MigrationId) -> GroundworkResult<()>;

    /// Returns whether a record for the given id and target exists.
    async fn contains(&self, target: TargetKind, id: &MigrationId) -> GroundworkResult<bool>;

    /// Returns all records for the given target.
    async fn entries(&self, target: TargetKind) -> GroundworkResult<Vec<AppliedRecord>>;
}

/// Write-through applied-state tracking for one target kind.
///
/// Every call goes straight to the [`LedgerStore`]; nothing is cached
/// between calls, since a racing runner may change the ledger at any time.
pub struct AppliedTracker {
    target: TargetKind,
    store: Arc<dyn LedgerStore>,
}

impl AppliedTracker {
    /// Creates a tracker for the given target kind over a ledger store.
    pub fn new(target: TargetKind, store: Arc<dyn LedgerStore>) -> Self {
        Self { target, store }
    }

    /// Returns whether the given unit has been applied.
    pub async fn is_applied(&self, id: &MigrationId) -> GroundworkResult<bool> {
        self.store.contains(self.target, id).await
    }

    /// Records the given unit as applied.
    ///
    /// Fails with [`GroundworkError::DuplicateApply`] if another runner got
    /// there first.
    pub async fn mark_applied(
        &self,
        id: &MigrationId,
        at: DateTime<Utc>,
    ) -> GroundworkResult<()> {
        self.store
            .insert(&AppliedRecord::new(id.clone(), self.target, at))
            .await
    }

    /// Removes the applied record for the given unit.
    ///
    /// Fails with [`GroundworkError::NotApplied`] if the unit is not
    /// recorded as applied.
    pub async fn unmark(&self, id: &MigrationId) -> GroundworkResult<()> {
        self.store.remove(self.target, id).await
    }

    /// Returns a snapshot of the applied ids, for planning.
    pub async fn applied_ids(&self) -> GroundworkResult<BTreeSet<MigrationId>> {
        let entries = self.store.entries(self.target).await?;
        Ok(entries.into_iter().map(|record| record.id).collect())
    }

    /// Returns all applied records for this target, ascending by id.
    pub async fn entries(&self) -> GroundworkResult<Vec<AppliedRecord>> {
        let mut entries = self.store.entries(self.target).await?;
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    /// Returns the target kind this tracker serves.
    pub const fn target(&self) -> TargetKind {
        self.target
    }
}

/// An in-memory [`LedgerStore`].
///
/// The mutex-guarded map gives the same insert-if-absent atomicity a real
/// store provides through its unique index. Used by the test suites and
/// available for dry runs.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: Mutex<HashMap<(TargetKind, MigrationId), DateTime<Utc>>>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records across all targets.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Returns whether the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn insert(&self, record: &AppliedRecord) -> GroundworkResult<()> {
        let mut records = self.records.lock().unwrap();
        let key = (record.target, record.id.clone());
        if records.contains_key(&key) {
            return Err(GroundworkError::DuplicateApply(record.id.to_string()));
        }
        records.insert(key, record.applied_at);
        Ok(())
    }

    async fn remove(&self, target: TargetKind, id: &MigrationId) -> GroundworkResult<()> {
        let mut records = self.records.lock().unwrap();
        if records.remove(&(target, id.clone())).is_none() {
            return Err(GroundworkError::NotApplied(id.to_string()));
        }
        Ok(())
    }

    async fn contains(&self, target: TargetKind, id: &MigrationId) -> GroundworkResult<bool> {
        let records = self.records.lock().unwrap();
        Ok(records.contains_key(&(target, id.clone())))
    }

    async fn entries(&self, target: TargetKind) -> GroundworkResult<Vec<AppliedRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|((t, _), _)| *t == target)
            .map(|((_, id), applied_at)| AppliedRecord::new(id.clone(), target, *applied_at))
            .collect())
    }
}
