//! Migration identity and the unit contract.
//!
//! A [`MigrationUnit`] is a single named, timestamp-ordered change with
//! `up`/`down` operations against one kind of external resource. Units are
//! identified by a [`MigrationId`] whose total order defines the order in
//! which the runner applies them.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use groundwork_core::{GroundworkError, GroundworkResult};
use serde::{Deserialize, Serialize};

/// The identity of one migration unit.
///
/// Conventionally the stamp is the unit's creation time in milliseconds
/// since the epoch, which makes ids strictly increasing as migrations are
/// authored. Ids order by stamp first, then lexically by slug, so two
/// units written in the same millisecond still have a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MigrationId {
    stamp: i64,
    slug: String,
}

impl MigrationId {
    /// Creates an id from a millisecond stamp and a human-readable slug.
    pub fn new(stamp: i64, slug: impl Into<String>) -> Self {
        Self {
            stamp,
            slug: slug.into(),
        }
    }

    /// Returns the numeric stamp.
    pub const fn stamp(&self) -> i64 {
        self.stamp
    }

    /// Returns the slug.
    pub fn slug(&self) -> &str {
        &self.slug
    }
}

impl Ord for MigrationId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.stamp
            .cmp(&other.stamp)
            .then_with(|| self.slug.cmp(&other.slug))
    }
}

impl PartialOrd for MigrationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.stamp, self.slug)
    }
}

/// The kind of external resource a migration targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    /// Document store schema: collections and their indexes.
    DocumentStore,
    /// Message broker topic topology.
    BrokerTopology,
}

impl TargetKind {
    /// Returns the canonical string form, as used by the CLI and ledger.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DocumentStore => "document-store",
            Self::BrokerTopology => "broker-topology",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = GroundworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document-store" => Ok(Self::DocumentStore),
            "broker-topology" => Ok(Self::BrokerTopology),
            other => Err(GroundworkError::Configuration(format!(
                "unknown target kind: {other} (expected document-store or broker-topology)"
            ))),
        }
    }
}

/// A single reversible migration against an external resource.
///
/// The type parameter `A` is the adapter capability the unit operates
/// through: [`DocumentStore`](groundwork_adapters::DocumentStore) for
/// schema units, [`BrokerAdmin`](groundwork_adapters::BrokerAdmin) for
/// topology units. Units are immutable once registered and must be
/// idempotent in `up`: re-application against a resource that already
/// holds the desired state succeeds silently.
#[async_trait]
pub trait MigrationUnit<A: ?Sized>: Send + Sync {
    /// Returns this unit's identity.
    fn id(&self) -> &MigrationId;

    /// Returns a human-readable description of this unit.
    fn describe(&self) -> String;

    /// Applies the change.
    async fn up(&self, adapter: &A) -> GroundworkResult<()>;

    /// Reverses the change.
    async fn down(&self, adapter: &A) -> GroundworkResult<()>;
}
