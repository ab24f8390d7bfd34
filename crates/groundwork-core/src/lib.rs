//! # groundwork-core
//!
//! Core types, settings, logging, and error types for the groundwork
//! migration engine. This crate has no engine dependencies and provides the
//! foundation for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Engine settings and global configuration
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;

// Re-export the most commonly used types at the crate root.
pub use error::{GroundworkError, GroundworkResult};
pub use settings::{BrokerSettings, SaslCredentials, Settings, StoreSettings, SETTINGS};
