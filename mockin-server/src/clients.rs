use crate::config::{ClientConfig, MockinConfig};
use consent_engine::scope::is_consent_scope;
use std::collections::HashMap;

/// Scope a client must be allowed before it can ask for `consent:<id>`.
pub const CONSENT_SCOPE: &str = "consent";

/// Registered OAuth clients, looked up by id.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, ClientConfig>,
}

impl ClientRegistry {
    pub fn new(clients: impl IntoIterator<Item = ClientConfig>) -> Self {
        Self {
            clients: clients
                .into_iter()
                .map(|client| (client.id.clone(), client))
                .collect(),
        }
    }

    pub fn from_config(config: &MockinConfig) -> Self {
        Self::new([config.oauth.client.clone()])
    }

    pub fn client(&self, id: &str) -> Option<&ClientConfig> {
        self.clients.get(id)
    }

    /// Returns the client only if the secret matches.
    pub fn authenticate(&self, id: &str, secret: &str) -> Option<&ClientConfig> {
        self.client(id).filter(|client| client.secret == secret)
    }
}

impl ClientConfig {
    pub fn allowed_scopes(&self) -> impl Iterator<Item = &str> {
        self.scopes.split_whitespace()
    }

    /// Whether the client may request `scope`. Dynamic consent scopes are
    /// allowed when the client holds the `consent` scope.
    pub fn allows_scope(&self, scope: &str) -> bool {
        if is_consent_scope(scope) {
            return self.allowed_scopes().any(|s| s == CONSENT_SCOPE);
        }
        self.allowed_scopes().any(|s| s == scope)
    }

    /// Scopes granted by the client credentials grant: the requested static
    /// scopes the client is allowed, or all of them when none were requested.
    /// Consent scopes are never granted without the owner.
    pub fn client_credentials_scopes(&self, requested: Option<&str>) -> Vec<String> {
        let grantable = |scope: &&str| *scope != CONSENT_SCOPE && !is_consent_scope(scope);
        match requested.filter(|r| !r.trim().is_empty()) {
            Some(requested) => requested
                .split_whitespace()
                .filter(grantable)
                .filter(|scope| self.allows_scope(scope))
                .map(str::to_string)
                .collect(),
            None => self
                .allowed_scopes()
                .filter(grantable)
                .map(str::to_string)
                .collect(),
        }
    }
}
