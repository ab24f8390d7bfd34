//! The document store capability interface.
//!
//! [`DocumentStore`] is the narrow surface index migrations use: create an
//! index, drop an index, check for one by name. Implementations wrap a real
//! document store driver.

use async_trait::async_trait;
use groundwork_core::GroundworkResult;
use serde::{Deserialize, Serialize};

/// Sort order of one field within an index key specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order.
    Ascending,
    /// Descending order.
    Descending,
}

/// An ordered index key specification, e.g. `{ userName: 1 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    /// The indexed fields in order, each with its sort order.
    pub fields: Vec<(String, SortOrder)>,
}

impl KeySpec {
    /// Creates a single-field ascending key spec.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            fields: vec![(field.into(), SortOrder::Ascending)],
        }
    }

    /// Creates a single-field descending key spec.
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            fields: vec![(field.into(), SortOrder::Descending)],
        }
    }

    /// Appends an ascending field to a compound key spec.
    #[must_use]
    pub fn then_ascending(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), SortOrder::Ascending));
        self
    }

    /// Appends a descending field to a compound key spec.
    #[must_use]
    pub fn then_descending(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), SortOrder::Descending));
        self
    }
}

/// Options for an index creation call.
///
/// Indexes are always named explicitly so that `drop_index` and existence
/// checks can address them without recomputing a driver-generated name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// The index name.
    pub name: String,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl IndexOptions {
    /// Creates options for a non-unique index with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique: false,
        }
    }

    /// Marks the index as unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// The capability interface for document store schema administration.
///
/// `create_index` follows the underlying drivers in rejecting an index whose
/// name is already taken; callers that need at-least-once semantics go
/// through [`ensure_index`] instead.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Establishes the store connection.
    async fn connect(&self) -> GroundworkResult<()>;

    /// Creates an index on a collection.
    ///
    /// Fails with [`GroundworkError::IndexCreate`](groundwork_core::GroundworkError::IndexCreate)
    /// if the index cannot be created, including when its name is taken.
    async fn create_index(
        &self,
        collection: &str,
        keys: &KeySpec,
        options: &IndexOptions,
    ) -> GroundworkResult<()>;

    /// Drops the named index from a collection.
    ///
    /// Fails with [`GroundworkError::IndexNotFound`](groundwork_core::GroundworkError::IndexNotFound)
    /// if no such index exists.
    async fn drop_index(&self, collection: &str, index_name: &str) -> GroundworkResult<()>;

    /// Returns whether the named index exists on a collection.
    async fn index_exists(&self, collection: &str, index_name: &str) -> GroundworkResult<bool>;

    /// Tears down the store connection.
    async fn disconnect(&self) -> GroundworkResult<()>;
}

/// Creates an index idempotently.
///
/// Checks for the index by name first; if it already exists the call
/// succeeds silently. Returns `true` if the index was actually created.
pub async fn ensure_index(
    store: &dyn DocumentStore,
    collection: &str,
    keys: &KeySpec,
    options: &IndexOptions,
) -> GroundworkResult<bool> {
    if store.index_exists(collection, &options.name).await? {
        tracing::debug!(
            collection,
            index = %options.name,
            "index already exists, skipping"
        );
        return Ok(false);
    }
    store.create_index(collection, keys, options).await?;
    Ok(true)
}
