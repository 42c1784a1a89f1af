//! Minimal OAuth 2.0 authorization server for the mock.
//!
//! ## Supported flows
//! - Authorization Code with optional PKCE, driven by the interactive
//!   login and consent flow (RFC 6749 Section 4.1)
//! - Client Credentials (RFC 6749 Section 4.4)
//! - Token Introspection (RFC 7662)
//!
//! Tokens and codes are opaque random strings kept in the document store.

pub mod handlers;
pub mod models;
pub mod pages;
pub mod token_manager;

use crate::state::AppState;
use axum::routing::{get, post, Router};

/// Creates OAuth 2.0 routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/authorize", get(handlers::authorize))
        .route(
            "/auth/authorize/{callback_id}",
            post(handlers::authorize_callback),
        )
        .route("/auth/token", post(handlers::token))
        .route("/auth/introspect", post(handlers::introspect))
}
