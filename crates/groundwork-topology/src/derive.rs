//! The topic topology deriver.
//!
//! [`derive_topology`] expands a [`TopicSpec`] into the full ordered set of
//! concrete topics: the base topic, each consumer's retry chain, and each
//! consumer's dead-letter topic. The function is pure and deterministic,
//! with no I/O and no clock, so the same spec always yields the same
//! topology and re-applying a topology migration is idempotent.

use std::collections::HashSet;

use groundwork_core::{GroundworkError, GroundworkResult};

use crate::spec::{TopicDescriptor, TopicSpec};

/// Suffix token for retry topics: `{logical}-{consumer}-retry-{tier}`.
const RETRY_TOKEN: &str = "-retry-";

/// Suffix for dead-letter topics: `{logical}-{consumer}-dead-letter`.
const DEAD_LETTER_SUFFIX: &str = "-dead-letter";

/// The ordered, validated output of the deriver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedTopology {
    topics: Vec<TopicDescriptor>,
}

impl DerivedTopology {
    /// Returns the derived topics in emission order.
    pub fn topics(&self) -> &[TopicDescriptor] {
        &self.topics
    }

    /// Returns the derived topic names in emission order.
    pub fn names(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.name.as_str()).collect()
    }

    /// Returns the number of derived topics.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Returns whether the topology is empty.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl IntoIterator for DerivedTopology {
    type Item = TopicDescriptor;
    type IntoIter = std::vec::IntoIter<TopicDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.topics.into_iter()
    }
}

/// Expands a [`TopicSpec`] into its full [`DerivedTopology`].
///
/// Emission order: the base topic first, then for each consumer (in spec
/// order) its retry topics for tiers `1..=retry_tier_count`, then its
/// dead-letter topic. Derived topics inherit the base partition count and
/// replication factor unless the consumer's policy overrides them.
///
/// # Errors
///
/// Returns [`GroundworkError::InvalidSpec`] when a partition count or
/// replication factor (base or override) is zero, when a consumer name
/// contains a reserved naming token, or when two derived names collide.
pub fn derive_topology(spec: &TopicSpec) -> GroundworkResult<DerivedTopology> {
    validate(spec)?;

    let mut topics = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let mut emit = |descriptor: TopicDescriptor| -> GroundworkResult<()> {
        if !seen.insert(descriptor.name.clone()) {
            return Err(GroundworkError::InvalidSpec(format!(
                "derived topic name collision: {}",
                descriptor.name
            )));
        }
        topics.push(descriptor);
        Ok(())
    };

    emit(TopicDescriptor::new(
        spec.logical_name.clone(),
        spec.base_partitions,
        spec.replication_factor,
    ))?;

    for consumer in &spec.consumers {
        let partitions = consumer.partitions.unwrap_or(spec.base_partitions);
        let replication = consumer
            .replication_factor
            .unwrap_or(spec.replication_factor);

        for tier in 1..=consumer.retry_tier_count {
            emit(TopicDescriptor::new(
                format!(
                    "{}-{}{RETRY_TOKEN}{tier}",
                    spec.logical_name, consumer.consumer_name
                ),
                partitions,
                replication,
            ))?;
        }

        emit(TopicDescriptor::new(
            format!(
                "{}-{}{DEAD_LETTER_SUFFIX}",
                spec.logical_name, consumer.consumer_name
            ),
            partitions,
            replication,
        ))?;
    }

    Ok(DerivedTopology { topics })
}

/// Checks spec-level invariants before any name is derived.
fn validate(spec: &TopicSpec) -> GroundworkResult<()> {
    if spec.logical_name.is_empty() {
        return Err(GroundworkError::InvalidSpec(
            "logical_name must not be empty".to_string(),
        ));
    }
    if spec.base_partitions == 0 {
        return Err(GroundworkError::InvalidSpec(format!(
            "{}: base_partitions must be positive",
            spec.logical_name
        )));
    }
    if spec.replication_factor == 0 {
        return Err(GroundworkError::InvalidSpec(format!(
            "{}: replication_factor must be positive",
            spec.logical_name
        )));
    }

    for consumer in &spec.consumers {
        if consumer.consumer_name.is_empty() {
            return Err(GroundworkError::InvalidSpec(format!(
                "{}: consumer_name must not be empty",
                spec.logical_name
            )));
        }
        // Reserved tokens would let a consumer name masquerade as another
        // consumer's retry or dead-letter topic.
        if consumer.consumer_name.contains(RETRY_TOKEN)
            || consumer.consumer_name.contains(DEAD_LETTER_SUFFIX)
        {
            return Err(GroundworkError::InvalidSpec(format!(
                "consumer name contains a reserved naming token: {}",
                consumer.consumer_name
            )));
        }
        if consumer.partitions == Some(0) {
            return Err(GroundworkError::InvalidSpec(format!(
                "{}: partitions override must be positive",
                consumer.consumer_name
            )));
        }
        if consumer.replication_factor == Some(0) {
            return Err(GroundworkError::InvalidSpec(format!(
                "{}: replication_factor override must be positive",
                consumer.consumer_name
            )));
        }
    }

    Ok(())
}
