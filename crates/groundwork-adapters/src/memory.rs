//! In-memory adapter implementations.
//!
//! [`MemoryBroker`] and [`MemoryStore`] back the capability interfaces with
//! plain hash maps. They mirror the behavior of real admin APIs where it
//! matters to the engine: duplicate creates are rejected, drops of missing
//! indexes fail, and operations require an open connection. The migration
//! test suites run entirely against these.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use groundwork_core::{GroundworkError, GroundworkResult};
use groundwork_topology::TopicDescriptor;

use crate::broker::{BrokerAdmin, CreateTopicsOptions};
use crate::store::{DocumentStore, IndexOptions, KeySpec};

// ── Broker ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct BrokerState {
    connected: bool,
    topics: HashMap<String, TopicDescriptor>,
}

/// An in-memory [`BrokerAdmin`].
#[derive(Debug, Default)]
pub struct MemoryBroker {
    state: Mutex<BrokerState>,
}

impl MemoryBroker {
    /// Creates a disconnected broker with no topics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored descriptor for a topic, if present.
    pub fn topic(&self, name: &str) -> Option<TopicDescriptor> {
        self.state.lock().unwrap().topics.get(name).cloned()
    }

    /// Returns how many topics exist.
    pub fn topic_count(&self) -> usize {
        self.state.lock().unwrap().topics.len()
    }

    /// Returns whether the broker connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    fn require_connected(state: &BrokerState) -> GroundworkResult<()> {
        if state.connected {
            Ok(())
        } else {
            Err(GroundworkError::Connection(
                "broker admin is not connected".to_string(),
            ))
        }
    }
}

#[async_trait]
impl BrokerAdmin for MemoryBroker {
    async fn connect(&self) -> GroundworkResult<()> {
        self.state.lock().unwrap().connected = true;
        Ok(())
    }

    async fn create_topics(
        &self,
        topics: &[TopicDescriptor],
        options: &CreateTopicsOptions,
    ) -> GroundworkResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::require_connected(&state)?;

        for topic in topics {
            if state.topics.contains_key(&topic.name) {
                return Err(GroundworkError::TopicCreate(format!(
                    "topic already exists: {}",
                    topic.name
                )));
            }
        }
        if options.validate_only {
            return Ok(());
        }
        for topic in topics {
            state.topics.insert(topic.name.clone(), topic.clone());
        }
        Ok(())
    }

    async fn topic_exists(&self, name: &str) -> GroundworkResult<bool> {
        let state = self.state.lock().unwrap();
        Self::require_connected(&state)?;
        Ok(state.topics.contains_key(name))
    }

    async fn list_topics(&self) -> GroundworkResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        Self::require_connected(&state)?;
        let mut names: Vec<String> = state.topics.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn disconnect(&self) -> GroundworkResult<()> {
        self.state.lock().unwrap().connected = false;
        Ok(())
    }
}

// ── Document store ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct StoredIndex {
    keys: KeySpec,
    unique: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    connected: bool,
    // collection name -> index name -> definition
    indexes: HashMap<String, HashMap<String, StoredIndex>>,
}

/// An in-memory [`DocumentStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    /// Creates a disconnected store with no indexes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index names on a collection, sorted.
    pub fn index_names(&self, collection: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut names: Vec<String> = state
            .indexes
            .get(collection)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Returns whether the named index on a collection is unique.
    pub fn index_is_unique(&self, collection: &str, index_name: &str) -> Option<bool> {
        let state = self.state.lock().unwrap();
        state
            .indexes
            .get(collection)
            .and_then(|m| m.get(index_name))
            .map(|idx| idx.unique)
    }

    /// Returns whether the store connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    fn require_connected(state: &StoreState) -> GroundworkResult<()> {
        if state.connected {
            Ok(())
        } else {
            Err(GroundworkError::Connection(
                "document store is not connected".to_string(),
            ))
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn connect(&self) -> GroundworkResult<()> {
        self.state.lock().unwrap().connected = true;
        Ok(())
    }

    async fn create_index(
        &self,
        collection: &str,
        keys: &KeySpec,
        options: &IndexOptions,
    ) -> GroundworkResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::require_connected(&state)?;

        let indexes = state.indexes.entry(collection.to_string()).or_default();
        if indexes.contains_key(&options.name) {
            return Err(GroundworkError::IndexCreate(format!(
                "index name already taken on {collection}: {}",
                options.name
            )));
        }
        indexes.insert(
            options.name.clone(),
            StoredIndex {
                keys: keys.clone(),
                unique: options.unique,
            },
        );
        Ok(())
    }

    async fn drop_index(&self, collection: &str, index_name: &str) -> GroundworkResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::require_connected(&state)?;

        let removed = state
            .indexes
            .get_mut(collection)
            .and_then(|m| m.remove(index_name));
        if removed.is_none() {
            return Err(GroundworkError::IndexNotFound(format!(
                "{collection}.{index_name}"
            )));
        }
        Ok(())
    }

    async fn index_exists(&self, collection: &str, index_name: &str) -> GroundworkResult<bool> {
        let state = self.state.lock().unwrap();
        Self::require_connected(&state)?;
        Ok(state
            .indexes
            .get(collection)
            .is_some_and(|m| m.contains_key(index_name)))
    }

    async fn disconnect(&self) -> GroundworkResult<()> {
        self.state.lock().unwrap().connected = false;
        Ok(())
    }
}
