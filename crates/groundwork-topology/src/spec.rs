//! Declarative topic specifications.
//!
//! A [`TopicSpec`] describes one logical message flow: the base topic and,
//! per consumer group, how many retry tiers that consumer gets. The deriver
//! in [`crate::derive`] expands a spec into concrete [`TopicDescriptor`]s.

use serde::{Deserialize, Serialize};

/// A concrete topic to be created on the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDescriptor {
    /// The topic name.
    pub name: String,
    /// Number of partitions.
    pub partitions: u32,
    /// Replication factor.
    pub replication_factor: u16,
}

impl TopicDescriptor {
    /// Creates a new topic descriptor.
    pub fn new(name: impl Into<String>, partitions: u32, replication_factor: u16) -> Self {
        Self {
            name: name.into(),
            partitions,
            replication_factor,
        }
    }
}

/// Retry policy for one consumer group of a logical topic.
///
/// Each consumer gets its own retry chain and dead-letter topic so one
/// slow or broken consumer's backlog never competes with another's. A
/// consumer with `retry_tier_count = 0` still gets a dead-letter topic:
/// unprocessable messages need a terminal sink even without retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerRetryPolicy {
    /// The consumer group name, used in derived topic names.
    pub consumer_name: String,
    /// How many retry topics to derive for this consumer.
    pub retry_tier_count: u32,
    /// Partition count override for this consumer's derived topics.
    #[serde(default)]
    pub partitions: Option<u32>,
    /// Replication factor override for this consumer's derived topics.
    #[serde(default)]
    pub replication_factor: Option<u16>,
}

impl ConsumerRetryPolicy {
    /// Creates a policy with the given retry tier count and no overrides.
    pub fn new(consumer_name: impl Into<String>, retry_tier_count: u32) -> Self {
        Self {
            consumer_name: consumer_name.into(),
            retry_tier_count,
            partitions: None,
            replication_factor: None,
        }
    }

    /// Overrides the partition count for this consumer's derived topics.
    #[must_use]
    pub const fn with_partitions(mut self, partitions: u32) -> Self {
        self.partitions = Some(partitions);
        self
    }

    /// Overrides the replication factor for this consumer's derived topics.
    #[must_use]
    pub const fn with_replication_factor(mut self, replication_factor: u16) -> Self {
        self.replication_factor = Some(replication_factor);
        self
    }
}

/// A declarative description of one logical topic and its consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSpec {
    /// The logical topic name; also the name of the base topic.
    pub logical_name: String,
    /// Partition count for the base topic and, by default, all derived topics.
    pub base_partitions: u32,
    /// Replication factor for the base topic and, by default, all derived topics.
    pub replication_factor: u16,
    /// Consumer retry policies, in emission order.
    #[serde(default)]
    pub consumers: Vec<ConsumerRetryPolicy>,
}

impl TopicSpec {
    /// Creates a spec with no consumers.
    pub fn new(logical_name: impl Into<String>, base_partitions: u32, replication_factor: u16) -> Self {
        Self {
            logical_name: logical_name.into(),
            base_partitions,
            replication_factor,
            consumers: Vec::new(),
        }
    }

    /// Adds a consumer retry policy.
    #[must_use]
    pub fn with_consumer(mut self, consumer: ConsumerRetryPolicy) -> Self {
        self.consumers.push(consumer);
        self
    }
}
