//! Token, authorization code and pending-session management for OAuth 2.0

use crate::api::oauth::models::{
    GrantInfo, PendingAuthorization, StoredAuthorizationCode, StoredToken,
};
use crate::store::{DocumentStore, Store, StoreError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use consent_engine::Clock;
use log::{debug, error, warn};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during token and authorization code operations
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Token not found or expired")]
    TokenNotFound,
    #[error("Authorization code not found or expired")]
    CodeNotFound,
    #[error("Authorization code was issued to another client")]
    InvalidClient,
    #[error("Redirect URI mismatch")]
    RedirectUriMismatch,
    #[error("PKCE validation failed: {0}")]
    PkceValidation(String),
}

#[derive(Clone)]
pub struct TokenManager {
    store: Store,
    token_ttl: u64,
    code_ttl: u64,
    clock: Arc<dyn Clock>,
}

impl TokenManager {
    pub fn new(store: Store, token_ttl: u64, code_ttl: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            token_ttl,
            code_ttl,
            clock,
        }
    }

    pub fn token_ttl(&self) -> u64 {
        self.token_ttl
    }

    fn now(&self) -> u64 {
        u64::try_from(self.clock.now().timestamp()).unwrap_or_default()
    }

    /// Generate a new access token
    pub async fn generate_token(
        &self,
        grant: GrantInfo,
    ) -> Result<(String, StoredToken), TokenError> {
        let token = generate_secure_value();
        let now = self.now();

        let stored_token = StoredToken {
            grant,
            expires_at: now + self.token_ttl,
            issued_at: now,
        };
        self.store
            .set(&format!("oauth_token:{}", token), &stored_token)
            .await?;

        debug!(
            "Generated token for '{}' via client '{}' with {} scopes, expires in {}s",
            stored_token.grant.subject,
            stored_token.grant.client_id,
            stored_token.grant.scopes.len(),
            self.token_ttl
        );

        Ok((token, stored_token))
    }

    /// Validate and retrieve token information
    pub async fn validate_token(&self, token: &str) -> Result<StoredToken, TokenError> {
        let key = format!("oauth_token:{}", token);
        let stored_token: StoredToken = self
            .store
            .get(&key)
            .await?
            .ok_or(TokenError::TokenNotFound)?;

        if self.now() >= stored_token.expires_at {
            if let Err(e) = self.store.delete(&key).await {
                warn!("Failed to delete expired token: {}", e);
            }
            return Err(TokenError::TokenNotFound);
        }

        Ok(stored_token)
    }

    /// Generate a new authorization code
    pub async fn generate_authorization_code(
        &self,
        grant: GrantInfo,
        redirect_uri: &str,
        code_challenge: Option<String>,
        code_challenge_method: Option<String>,
    ) -> Result<(String, StoredAuthorizationCode), TokenError> {
        let code = generate_secure_value();
        let now = self.now();

        let stored_code = StoredAuthorizationCode {
            grant,
            redirect_uri: redirect_uri.to_string(),
            code_challenge,
            code_challenge_method,
            expires_at: now + self.code_ttl,
            issued_at: now,
        };
        self.store
            .set(&format!("oauth_code:{}", code), &stored_code)
            .await?;

        debug!(
            "Generated authorization code for '{}' via client '{}', expires in {}s",
            stored_code.grant.subject, stored_code.grant.client_id, self.code_ttl
        );

        Ok((code, stored_code))
    }

    /// Validate and consume an authorization code. Codes are single-use: any
    /// lookup that finds the code removes it, whether or not it validates.
    pub async fn validate_authorization_code(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: Option<&str>,
        code_verifier: Option<&str>,
    ) -> Result<StoredAuthorizationCode, TokenError> {
        let stored_code = redeem_code(&self.store, code).await?;

        if self.now() >= stored_code.expires_at {
            return Err(TokenError::CodeNotFound);
        }
        if stored_code.grant.client_id != client_id {
            return Err(TokenError::InvalidClient);
        }
        if redirect_uri.is_some_and(|uri| uri != stored_code.redirect_uri) {
            return Err(TokenError::RedirectUriMismatch);
        }
        if let Some(challenge) = &stored_code.code_challenge {
            let verifier = code_verifier.ok_or_else(|| {
                TokenError::PkceValidation("code_verifier required for PKCE".to_string())
            })?;
            validate_pkce(
                challenge,
                stored_code.code_challenge_method.as_deref(),
                verifier,
            )?;
        }

        Ok(stored_code)
    }

    pub async fn save_pending(&self, pending: &PendingAuthorization) -> Result<(), TokenError> {
        self.store
            .set(&pending_key(&pending.session.callback_id), pending)
            .await?;
        Ok(())
    }

    pub async fn load_pending(
        &self,
        callback_id: &str,
    ) -> Result<Option<PendingAuthorization>, TokenError> {
        Ok(self.store.get(&pending_key(callback_id)).await?)
    }

    pub async fn delete_pending(&self, callback_id: &str) -> Result<(), TokenError> {
        self.store.delete(&pending_key(callback_id)).await?;
        Ok(())
    }
}

/// Reads and removes an authorization code. The code is only returned once
/// the delete succeeded, so a store failure cannot leave it redeemable.
async fn redeem_code<S: DocumentStore>(
    store: &S,
    code: &str,
) -> Result<StoredAuthorizationCode, TokenError> {
    let key = format!("oauth_code:{}", code);
    let stored_code: StoredAuthorizationCode =
        store.get(&key).await?.ok_or(TokenError::CodeNotFound)?;

    if let Err(e) = store.delete(&key).await {
        error!("Failed to delete consumed authorization code: {}", e);
        return Err(TokenError::Store(e));
    }
    Ok(stored_code)
}

fn pending_key(callback_id: &str) -> String {
    format!("authn_session:{}", callback_id)
}

fn validate_pkce(
    code_challenge: &str,
    code_challenge_method: Option<&str>,
    code_verifier: &str,
) -> Result<(), TokenError> {
    let method = code_challenge_method.unwrap_or("plain");
    let expected_challenge = match method {
        "S256" => URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes())),
        "plain" => code_verifier.to_string(),
        _ => {
            return Err(TokenError::PkceValidation(format!(
                "Unsupported code_challenge_method: {}",
                method
            )));
        }
    };

    if expected_challenge != code_challenge {
        return Err(TokenError::PkceValidation(
            "code_verifier does not match code_challenge".to_string(),
        ));
    }
    Ok(())
}

/// 32 random bytes, base64url encoded without padding.
pub fn generate_secure_value() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    URL_SAFE_NO_PAD.encode(bytes)
}
