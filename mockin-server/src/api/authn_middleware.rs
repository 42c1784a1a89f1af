use crate::api::oauth::token_manager::TokenError;
use crate::api::operation::Operation;
use crate::clients::CONSENT_SCOPE;
use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use consent_engine::scope::{consent_id_from_scopes, is_consent_scope};
use log::{error, warn};

const UNAUTHORISED: &str = "UNAUTHORISED";

/// Caller identity resolved from the bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMeta {
    pub client_id: String,
    pub subject: String,
    /// The consent bound to the token, if any.
    pub consent_id: Option<String>,
    pub scopes: Vec<String>,
}

pub(crate) async fn authentication_middleware(
    State(state): State<AppState>,
    Extension(operation): Extension<Operation>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        warn!("Missing bearer token for {}", operation.name);
        return ApiError::unauthorized(UNAUTHORISED, "missing token").into_response();
    };

    let stored = match state.tokens.validate_token(&token).await {
        Ok(stored) => stored,
        Err(TokenError::TokenNotFound) => {
            warn!("Invalid or expired token for {}", operation.name);
            return ApiError::unauthorized(UNAUTHORISED, "invalid token").into_response();
        }
        Err(err) => {
            error!("Failed to validate token: {}", err);
            return ApiError::internal().into_response();
        }
    };

    if !has_scopes(&stored.grant.scopes, operation.scopes) {
        warn!(
            "Token of client {} is missing scopes {:?} for {}",
            stored.grant.client_id, operation.scopes, operation.name
        );
        return ApiError::unauthorized(UNAUTHORISED, "token missing scopes").into_response();
    }

    let joined = stored.grant.scopes.join(" ");
    let meta = RequestMeta {
        client_id: stored.grant.client_id.clone(),
        subject: stored.grant.subject.clone(),
        consent_id: consent_id_from_scopes(&joined).map(str::to_string),
        scopes: stored.grant.scopes,
    };
    request.extensions_mut().insert(meta);
    next.run(request).await
}

fn bearer_token(request: &Request) -> Option<String> {
    let header = request.headers().get(http::header::AUTHORIZATION)?;
    let value = match header.to_str() {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse Authorization header to string: {}", e);
            return None;
        }
    };
    if value.len() > 7 && value[..7].eq_ignore_ascii_case("bearer ") {
        Some(value[7..].trim().to_string())
    } else {
        warn!("Invalid Authorization header format, missing 'Bearer ' prefix");
        None
    }
}

fn has_scopes(granted: &[String], required: &[&str]) -> bool {
    required.iter().all(|required| {
        granted.iter().any(|scope| {
            if *required == CONSENT_SCOPE {
                is_consent_scope(scope)
            } else {
                scope == required
            }
        })
    })
}
