use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OAuthConfig {
    /// Access token lifetime in seconds
    pub token_ttl: u64,

    /// Authorization code lifetime in seconds
    pub code_ttl: u64,

    /// Token issuer, defaults to the public host
    pub issuer: Option<String>,

    pub client: ClientConfig,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            token_ttl: 300,
            code_ttl: 600,
            issuer: None,
            client: ClientConfig::default(),
        }
    }
}

/// The registered third-party client
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    pub id: String,
    pub secret: String,
    pub redirect_uri: String,
    /// Base URI webhook notifications are sent to
    pub webhook_uri: Option<String>,
    /// Space-separated static scopes the client may request
    pub scopes: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            id: "mockin_client".to_string(),
            secret: "mockin_secret".to_string(),
            redirect_uri: "https://localhost.emobix.co.uk:8443/test/a/mockin/callback".to_string(),
            webhook_uri: None,
            scopes: "openid consents consent resources customers capitalization-title endorsement quote-auto quote-auto-lead".to_string(),
        }
    }
}
