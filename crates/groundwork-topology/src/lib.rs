//! # groundwork-topology
//!
//! Declarative topic specifications and the deterministic topology deriver.
//!
//! A logical message flow is described once as a [`TopicSpec`]: a base topic
//! plus a retry policy per consumer group. [`derive_topology`] expands that
//! description into every concrete topic the broker needs (the base topic,
//! a per-consumer retry chain, and a per-consumer dead-letter topic) with
//! no I/O, so topology can be unit-tested without a broker connection.
//!
//! ## Modules
//!
//! - [`spec`] - `TopicSpec`, `ConsumerRetryPolicy`, `TopicDescriptor`
//! - [`derive`] - `derive_topology` and `DerivedTopology`

pub mod derive;
pub mod spec;

// Re-export key types at the crate root.
pub use derive::{derive_topology, DerivedTopology};
pub use spec::{ConsumerRetryPolicy, TopicDescriptor, TopicSpec};
