pub(crate) use crate::config::oauth::{ClientConfig, OAuthConfig};
pub(crate) use crate::config::store::{StoreConfig, StoreKind};
pub(crate) use crate::config::webhook::WebhookConfig;
use config::{Config as ConfigCrate, ConfigError, Map};
use serde::Deserialize;
use std::time::Duration;

pub mod oauth;
pub mod store;
pub mod webhook;

/// Main configuration structure for the mock server
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MockinConfig {
    /// The port the server listens on (default: 8080)
    pub port: u16,

    /// Public base URL, used for links and HTML form targets
    pub host: String,

    /// How long a consent may wait for the owner before it is rejected
    pub max_awaiting_authorisation_secs: u64,

    /// Namespace used in consent ids, `urn:<namespace>:<uuid>`
    pub consent_namespace: String,

    pub store: StoreConfig,

    pub oauth: OAuthConfig,

    pub webhook: WebhookConfig,
}

impl Default for MockinConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "http://localhost:8080".to_string(),
            max_awaiting_authorisation_secs: 3600,
            consent_namespace: "mockin".to_string(),
            store: StoreConfig::default(),
            oauth: OAuthConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl MockinConfig {
    /// Creates a new config from `MOCKIN_*` environment variables.
    ///
    /// Nested keys use a double underscore, e.g. `MOCKIN_STORE__KIND=redis`.
    pub fn new() -> Result<Self, String> {
        Self::load(None)
    }

    fn load(source: Option<Map<String, String>>) -> Result<Self, String> {
        ConfigCrate::builder()
            .add_source(
                config::Environment::with_prefix("MOCKIN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(source),
            )
            .build()
            .map_err(|e: ConfigError| e.to_string())?
            .try_deserialize()
            .map_err(|e| e.to_string())
    }

    pub fn max_awaiting_authorisation(&self) -> Duration {
        Duration::from_secs(self.max_awaiting_authorisation_secs)
    }

    pub fn issuer(&self) -> String {
        self.oauth
            .issuer
            .clone()
            .unwrap_or_else(|| self.host.clone())
    }

    /// Public URL of a server path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), path)
    }

    #[cfg(test)]
    pub fn for_test() -> Self {
        Self {
            port: 0,
            host: "https://mockin.local".to_string(),
            webhook: WebhookConfig {
                delay_secs: 0,
                timeout_secs: 2,
            },
            ..Default::default()
        }
    }
}
