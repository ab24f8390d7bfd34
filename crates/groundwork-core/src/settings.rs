//! Settings for the groundwork migration engine.
//!
//! This module provides the [`Settings`] struct holding all engine
//! configuration, and [`LazySettings`], a globally-accessible,
//! lazily-initialized settings instance.
//!
//! Settings are assembled by the launcher from already-resolved values
//! (command-line flags, environment, or a TOML file). Nothing in this
//! workspace reads environment variables directly; the launcher owns that
//! boundary and passes finished values in.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{GroundworkError, GroundworkResult};

/// SASL credentials for authenticating against the message broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaslCredentials {
    /// The SASL username.
    pub username: String,
    /// The SASL password.
    pub password: String,
}

/// Connection configuration for the message broker admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    /// Bootstrap addresses, e.g. `["broker-1:9092", "broker-2:9092"]`.
    pub bootstrap_servers: Vec<String>,
    /// Optional SASL credentials. Presence of credentials also enables TLS.
    pub sasl: Option<SaslCredentials>,
    /// Default per-call timeout in milliseconds for admin operations.
    pub timeout_ms: u64,
}

impl BrokerSettings {
    /// Creates broker settings for the given bootstrap addresses.
    pub fn new(bootstrap_servers: Vec<String>) -> Self {
        Self {
            bootstrap_servers,
            sasl: None,
            timeout_ms: 30_000,
        }
    }

    /// Attaches SASL credentials.
    #[must_use]
    pub fn with_sasl(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.sasl = Some(SaslCredentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Returns whether TLS should be enabled for broker connections.
    ///
    /// TLS is on exactly when SASL credentials are present.
    pub const fn tls_enabled(&self) -> bool {
        self.sasl.is_some()
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self::new(vec!["localhost:9092".to_string()])
    }
}

/// Connection configuration for the document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// The connection URI.
    pub uri: String,
    /// The database name.
    pub database: String,
    /// The collection holding the migration ledger.
    pub ledger_collection: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "db".to_string(),
            ledger_collection: "migrations".to_string(),
        }
    }
}

/// Top-level settings for the migration engine.
///
/// Use [`SETTINGS`] to access the global instance after the launcher has
/// called `SETTINGS.configure(..)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether debug mode is enabled. Controls log formatting.
    pub debug: bool,
    /// The log filter directive (e.g. "info", "groundwork=debug").
    pub log_level: String,
    /// Broker connection configuration.
    pub broker: BrokerSettings,
    /// Document store connection configuration.
    pub store: StoreSettings,
}

impl Settings {
    /// Creates settings with defaults: debug off, "info" logging, local
    /// broker and store endpoints.
    pub fn new() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            broker: BrokerSettings::default(),
            store: StoreSettings::default(),
        }
    }

    /// Parses settings from a TOML document.
    ///
    /// Missing keys fall back to their defaults, so a partial file such as
    /// `broker.bootstrap_servers = ["b:9092"]` is valid.
    pub fn from_toml_str(content: &str) -> GroundworkResult<Self> {
        toml::from_str(content)
            .map_err(|e| GroundworkError::Configuration(format!("invalid settings TOML: {e}")))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup, then use
/// [`get`](LazySettings::get) to access the settings anywhere.
///
/// # Panics
///
/// [`get`](LazySettings::get) panics if settings have not been configured.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Sets the global settings. Later calls are ignored.
    pub fn configure(&self, settings: Settings) {
        let _ = self.inner.set(settings);
    }

    /// Returns the configured settings.
    pub fn get(&self) -> &Settings {
        self.inner
            .get()
            .expect("Settings have not been configured. Call SETTINGS.configure() first.")
    }

    /// Returns whether the settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();
