//! OAuth 2.0 data models and request/response structures

use consent_engine::AuthnSession;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// OAuth 2.0 Authorization Request (Authorization Code Flow)
#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthorizationRequest {
    /// Response type - must be "code"
    pub response_type: String,
    /// Client identifier
    pub client_id: String,
    /// Redirect URI where authorization code will be sent
    pub redirect_uri: String,
    /// Requested scopes (space-separated)
    pub scope: Option<String>,
    /// State parameter for CSRF protection
    pub state: Option<String>,
    /// PKCE code challenge
    pub code_challenge: Option<String>,
    /// PKCE code challenge method (S256 or plain)
    pub code_challenge_method: Option<String>,
}

/// OAuth 2.0 Authorization Error Response
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorizationError {
    pub error: String,
    pub error_description: Option<String>,
    pub state: Option<String>,
}

/// OAuth 2.0 Token Request (supports both Authorization Code and Client Credentials)
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    /// "authorization_code" or "client_credentials"
    pub grant_type: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Authorization code (for authorization_code grant)
    pub code: Option<String>,
    /// Must match the authorization request (for authorization_code grant)
    pub redirect_uri: Option<String>,
    /// PKCE code verifier
    pub code_verifier: Option<String>,
    /// Requested scopes (space-separated, for client_credentials grant)
    pub scope: Option<String>,
}

/// OAuth 2.0 Token Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Token expiration in seconds
    pub expires_in: u64,
    /// Granted scopes (space-separated)
    pub scope: String,
}

/// OAuth 2.0 Token Introspection Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct IntrospectionRequest {
    #[serde(default)]
    pub token: String,
}

/// OAuth 2.0 Token Introspection Response (RFC 7662)
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct IntrospectionResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,
}

impl IntrospectionResponse {
    pub fn inactive() -> Self {
        Self::default()
    }
}

/// OAuth 2.0 Error Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OAuthError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

/// What a token or authorization code was granted for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantInfo {
    /// Resource owner, or the client id for client credentials
    pub subject: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub acr: Option<String>,
    /// Unix time of the owner's authentication
    pub auth_time: Option<i64>,
}

/// Token storage model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(flatten)]
    pub grant: GrantInfo,
    pub expires_at: u64,
    pub issued_at: u64,
}

/// Authorization code storage model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAuthorizationCode {
    #[serde(flatten)]
    pub grant: GrantInfo,
    /// Must match the token request
    pub redirect_uri: String,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub expires_at: u64,
    pub issued_at: u64,
}

/// An interactive authorization waiting for the owner's next form post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub session: AuthnSession,
    pub redirect_uri: String,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

impl OAuthError {
    fn new(error: &str, description: &str) -> Self {
        Self {
            error: error.to_string(),
            error_description: Some(description.to_string()),
        }
    }

    pub fn invalid_request(description: &str) -> Self {
        Self::new("invalid_request", description)
    }

    pub fn invalid_client(description: &str) -> Self {
        Self::new("invalid_client", description)
    }

    pub fn invalid_grant(description: &str) -> Self {
        Self::new("invalid_grant", description)
    }

    pub fn unsupported_grant_type() -> Self {
        Self::new(
            "unsupported_grant_type",
            "Supported grant types: authorization_code, client_credentials",
        )
    }

    pub fn server_error(description: &str) -> Self {
        Self::new("server_error", description)
    }
}

impl AuthorizationError {
    fn new(error: &str, description: &str, state: Option<String>) -> Self {
        Self {
            error: error.to_string(),
            error_description: Some(description.to_string()),
            state,
        }
    }

    pub fn unsupported_response_type(state: Option<String>) -> Self {
        Self::new(
            "unsupported_response_type",
            "Only 'code' response type is supported",
            state,
        )
    }

    pub fn invalid_scope(description: &str, state: Option<String>) -> Self {
        Self::new("invalid_scope", description, state)
    }

    pub fn access_denied(description: &str, state: Option<String>) -> Self {
        Self::new("access_denied", description, state)
    }

    pub fn server_error(description: &str, state: Option<String>) -> Self {
        Self::new("server_error", description, state)
    }
}
