//! The broker admin capability interface.
//!
//! [`BrokerAdmin`] is the narrow surface migration units use to manage
//! topic topology. Implementations wrap a real broker admin client; the
//! engine never talks to a broker library directly.

use async_trait::async_trait;
use groundwork_core::GroundworkResult;
use groundwork_topology::TopicDescriptor;

/// Options for a `create_topics` call.
#[derive(Debug, Clone)]
pub struct CreateTopicsOptions {
    /// Validate the request on the broker without creating anything.
    pub validate_only: bool,
    /// Wait until the new topics have elected leaders before returning.
    pub wait_for_leaders: bool,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for CreateTopicsOptions {
    fn default() -> Self {
        Self {
            validate_only: false,
            wait_for_leaders: true,
            timeout_ms: 30_000,
        }
    }
}

/// The capability interface for broker topology administration.
///
/// All methods are async because they wrap network calls to the broker's
/// admin API. Implementations must be shareable across tasks.
///
/// `create_topics` follows the underlying admin APIs in rejecting topics
/// that already exist; callers that need at-least-once semantics go through
/// [`ensure_topics`] instead.
#[async_trait]
pub trait BrokerAdmin: Send + Sync {
    /// Establishes the admin connection.
    async fn connect(&self) -> GroundworkResult<()>;

    /// Creates the given topics.
    ///
    /// Fails with [`GroundworkError::TopicCreate`](groundwork_core::GroundworkError::TopicCreate)
    /// if any topic cannot be created, including when it already exists.
    async fn create_topics(
        &self,
        topics: &[TopicDescriptor],
        options: &CreateTopicsOptions,
    ) -> GroundworkResult<()>;

    /// Returns whether a topic with the given name exists.
    async fn topic_exists(&self, name: &str) -> GroundworkResult<bool>;

    /// Returns the names of all topics, sorted.
    async fn list_topics(&self) -> GroundworkResult<Vec<String>>;

    /// Tears down the admin connection.
    async fn disconnect(&self) -> GroundworkResult<()>;
}

/// Creates the given topics idempotently.
///
/// Checks existence for each descriptor first and only creates the missing
/// ones, so re-running a topology migration against a broker that already
/// has some or all of its topics succeeds silently. Returns the names of
/// the topics that were actually created.
pub async fn ensure_topics(
    admin: &dyn BrokerAdmin,
    topics: &[TopicDescriptor],
    options: &CreateTopicsOptions,
) -> GroundworkResult<Vec<String>> {
    let mut missing = Vec::new();
    for topic in topics {
        if admin.topic_exists(&topic.name).await? {
            tracing::debug!(topic = %topic.name, "topic already exists, skipping");
        } else {
            missing.push(topic.clone());
        }
    }

    if missing.is_empty() {
        return Ok(Vec::new());
    }

    admin.create_topics(&missing, options).await?;
    Ok(missing.into_iter().map(|t| t.name).collect())
}
