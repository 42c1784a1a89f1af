//! OAuth 2.0 endpoint handlers

use crate::api::oauth::{
    models::{
        AuthorizationError, AuthorizationRequest, GrantInfo, IntrospectionRequest,
        IntrospectionResponse, OAuthError, PendingAuthorization, TokenRequest, TokenResponse,
    },
    pages,
    token_manager::{generate_secure_value, TokenError},
};
use crate::openapi::OAUTH_TAG;
use crate::state::AppState;
use axum::{
    extract::{rejection::FormRejection, Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use consent_engine::{AuthnSession, ConsentError, FlowInput, Outcome};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use url::Url;

/// OAuth 2.0 Authorization endpoint (RFC 6749 Section 4.1.1)
///
/// Starts the interactive flow and renders its first page.
#[utoipa::path(
    get,
    path = "/auth/authorize",
    params(
        ("response_type" = String, Query, description = "Must be 'code'"),
        ("client_id" = String, Query, description = "Client identifier"),
        ("redirect_uri" = String, Query, description = "Redirect URI"),
        ("scope" = Option<String>, Query, description = "Requested scopes, including consent:<id>"),
        ("state" = Option<String>, Query, description = "State parameter for CSRF protection"),
        ("code_challenge" = Option<String>, Query, description = "PKCE code challenge"),
        ("code_challenge_method" = Option<String>, Query, description = "PKCE code challenge method")
    ),
    responses(
        (status = 200, description = "Login or consent page", body = String, content_type = "text/html"),
        (status = 303, description = "Redirect to redirect_uri with a code or an error"),
        (status = 400, description = "Unknown client or redirect_uri", body = OAuthError)
    ),
    tag = OAUTH_TAG
)]
pub async fn authorize(
    State(state): State<AppState>,
    Query(request): Query<AuthorizationRequest>,
) -> Response {
    info!(
        "OAuth authorization request from client_id: {}",
        request.client_id
    );

    let Some(client) = state.clients.client(&request.client_id) else {
        warn!("Authorization request for unknown client {}", request.client_id);
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_request("Invalid client_id"),
        );
    };
    if client.redirect_uri != request.redirect_uri {
        warn!(
            "Redirect URI {} is not registered for client {}",
            request.redirect_uri, request.client_id
        );
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_request("Invalid redirect_uri"),
        );
    }

    if request.response_type != "code" {
        return redirect_with_error(
            &request.redirect_uri,
            AuthorizationError::unsupported_response_type(request.state),
        );
    }

    let scope = request.scope.unwrap_or_default();
    if let Some(scope) = scope
        .split_whitespace()
        .find(|scope| !client.allows_scope(scope))
    {
        debug!("Client {} may not request scope {}", request.client_id, scope);
        return redirect_with_error(
            &request.redirect_uri,
            AuthorizationError::invalid_scope(&format!("scope {} is not allowed", scope), request.state),
        );
    }

    let pending = PendingAuthorization {
        session: AuthnSession::new(generate_secure_value(), &request.client_id, scope),
        redirect_uri: request.redirect_uri,
        state: request.state,
        code_challenge: request.code_challenge,
        code_challenge_method: request.code_challenge_method,
    };
    advance(&state, pending, &FlowInput::default()).await
}

/// Receives the login and consent forms of a pending authorization
#[utoipa::path(
    post,
    path = "/auth/authorize/{callback_id}",
    params(("callback_id" = String, Path, description = "Pending authorization id")),
    responses(
        (status = 200, description = "Next login or consent page", body = String, content_type = "text/html"),
        (status = 303, description = "Redirect to redirect_uri with a code or an error"),
        (status = 400, description = "Unknown authorization session", body = OAuthError)
    ),
    tag = OAUTH_TAG
)]
pub async fn authorize_callback(
    State(state): State<AppState>,
    Path(callback_id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    match state.tokens.load_pending(&callback_id).await {
        Ok(Some(pending)) => advance(&state, pending, &FlowInput::from_form(&form)).await,
        Ok(None) => {
            warn!("Unknown authorization session {}", callback_id);
            error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_request("Unknown authorization session"),
            )
        }
        Err(e) => {
            error!("Error loading authorization session {}: {}", callback_id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                OAuthError::server_error("Failed to load authorization session"),
            )
        }
    }
}

/// Resumes the flow once and maps the outcome to a page or a redirect.
async fn advance(state: &AppState, mut pending: PendingAuthorization, input: &FlowInput) -> Response {
    let outcome = state.flow.resume(&mut pending.session, input).await;
    let callback_id = pending.session.callback_id.clone();

    match outcome {
        Outcome::InProgress(prompt) => {
            if let Err(e) = state.tokens.save_pending(&pending).await {
                error!("Error saving authorization session {}: {}", callback_id, e);
                return redirect_with_error(
                    &pending.redirect_uri,
                    AuthorizationError::server_error("Failed to save authorization session", pending.state),
                );
            }
            let action = state
                .config
                .url(&format!("/auth/authorize/{}", callback_id));
            Html(pages::render(&prompt, &action)).into_response()
        }
        Outcome::Success => {
            forget(state, &callback_id).await;
            let session = pending.session;
            let grant = GrantInfo {
                subject: session.user_id.unwrap_or_default(),
                client_id: session.client_id,
                scopes: session
                    .granted_scopes
                    .unwrap_or_default()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
                acr: session.acr,
                auth_time: session.auth_time.map(|time| time.timestamp()),
            };
            let subject = grant.subject.clone();
            let code = match state
                .tokens
                .generate_authorization_code(
                    grant,
                    &pending.redirect_uri,
                    pending.code_challenge,
                    pending.code_challenge_method,
                )
                .await
            {
                Ok((code, _)) => code,
                Err(e) => {
                    error!("Error generating authorization code: {}", e);
                    return redirect_with_error(
                        &pending.redirect_uri,
                        AuthorizationError::server_error("Failed to generate authorization code", pending.state),
                    );
                }
            };
            info!("Issued authorization code for user '{}'", subject);
            redirect_with_params(
                &pending.redirect_uri,
                &[("code", Some(code.as_str())), ("state", pending.state.as_deref())],
            )
        }
        Outcome::Failure(reason) => {
            forget(state, &callback_id).await;
            redirect_with_error(
                &pending.redirect_uri,
                AuthorizationError::access_denied(&reason, pending.state),
            )
        }
    }
}

async fn forget(state: &AppState, callback_id: &str) {
    if let Err(e) = state.tokens.delete_pending(callback_id).await {
        warn!("Failed to delete authorization session {}: {}", callback_id, e);
    }
}

/// OAuth 2.0 Token endpoint (RFC 6749)
/// Supports both Authorization Code and Client Credentials flows
#[utoipa::path(
    post,
    path = "/auth/token",
    request_body(content = TokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Access token issued successfully", body = TokenResponse),
        (status = 400, description = "Invalid request or grant", body = OAuthError),
        (status = 401, description = "Invalid client credentials", body = OAuthError),
        (status = 500, description = "Internal server error", body = OAuthError)
    ),
    tag = OAUTH_TAG
)]
pub async fn token(
    State(state): State<AppState>,
    request: Result<Form<TokenRequest>, FormRejection>,
) -> Response {
    let Form(request) = match request {
        Ok(request) => request,
        Err(e) => {
            debug!("Malformed token request: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_request("Malformed token request"),
            );
        }
    };
    info!(
        "OAuth token request from client_id: {} with grant_type: {}",
        request.client_id, request.grant_type
    );

    let Some(client) = state
        .clients
        .authenticate(&request.client_id, &request.client_secret)
    else {
        warn!(
            "Invalid client credentials for client_id: {}",
            request.client_id
        );
        return error_response(
            StatusCode::UNAUTHORIZED,
            OAuthError::invalid_client("Invalid client credentials"),
        );
    };

    let grant = match request.grant_type.as_str() {
        "authorization_code" => match redeem_code(&state, &request).await {
            Ok(grant) => grant,
            Err(response) => return response,
        },
        "client_credentials" => GrantInfo {
            subject: client.id.clone(),
            client_id: client.id.clone(),
            scopes: client.client_credentials_scopes(request.scope.as_deref()),
            acr: None,
            auth_time: None,
        },
        _ => {
            warn!(
                "Unsupported grant type '{}' from client '{}'",
                request.grant_type, request.client_id
            );
            return error_response(StatusCode::BAD_REQUEST, OAuthError::unsupported_grant_type());
        }
    };

    issue_token(&state, grant).await
}

/// Validates and consumes the authorization code of the request.
async fn redeem_code(state: &AppState, request: &TokenRequest) -> Result<GrantInfo, Response> {
    let Some(code) = request.code.as_deref() else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_request("code parameter is required for authorization_code grant"),
        ));
    };

    match state
        .tokens
        .validate_authorization_code(
            code,
            &request.client_id,
            request.redirect_uri.as_deref(),
            request.code_verifier.as_deref(),
        )
        .await
    {
        Ok(stored) => Ok(stored.grant),
        Err(TokenError::Store(e)) => {
            error!("Error validating authorization code: {}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                OAuthError::server_error("Failed to validate authorization code"),
            ))
        }
        Err(e) => {
            warn!("Rejected authorization code: {}", e);
            Err(error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_grant(&e.to_string()),
            ))
        }
    }
}

/// Runs the consent grant hook, then stores a new access token.
async fn issue_token(state: &AppState, grant: GrantInfo) -> Response {
    let scope = grant.scopes.join(" ");
    match state.consents.handle_grant(&grant.client_id, &scope).await {
        Ok(()) => {}
        Err(ConsentError::Internal(e)) => {
            error!("Error checking consent for grant: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                OAuthError::server_error("Failed to check the consent"),
            );
        }
        Err(e) => {
            warn!("Refusing grant to client {}: {}", grant.client_id, e);
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_grant(&e.to_string()),
            );
        }
    }

    let (access_token, stored) = match state.tokens.generate_token(grant).await {
        Ok(token_data) => token_data,
        Err(e) => {
            error!("Error generating access token: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                OAuthError::server_error("Failed to generate access token"),
            );
        }
    };

    info!(
        "Issued access token to '{}' via client '{}' with scopes '{}'",
        stored.grant.subject, stored.grant.client_id, scope
    );

    Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.token_ttl(),
        scope,
    })
    .into_response()
}

/// OAuth 2.0 Token Introspection endpoint (RFC 7662)
#[utoipa::path(
    post,
    path = "/auth/introspect",
    request_body(content = IntrospectionRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token introspection result", body = IntrospectionResponse),
        (status = 400, description = "Invalid request", body = OAuthError),
        (status = 500, description = "Internal server error", body = OAuthError)
    ),
    tag = OAUTH_TAG
)]
pub async fn introspect(
    State(state): State<AppState>,
    Form(request): Form<IntrospectionRequest>,
) -> Response {
    if request.token.is_empty() {
        warn!("Empty token in introspection request");
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_request("token parameter is required"),
        );
    }

    let stored = match state.tokens.validate_token(&request.token).await {
        Ok(stored) => stored,
        Err(TokenError::TokenNotFound) => {
            debug!("Token not found or expired during introspection");
            return Json(IntrospectionResponse::inactive()).into_response();
        }
        Err(e) => {
            error!("Error validating token during introspection: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                OAuthError::server_error("Failed to validate token"),
            );
        }
    };

    Json(IntrospectionResponse {
        active: true,
        client_id: Some(stored.grant.client_id),
        sub: Some(stored.grant.subject),
        scope: Some(stored.grant.scopes.join(" ")),
        exp: Some(stored.expires_at),
        iat: Some(stored.issued_at),
        iss: Some(state.config.issuer()),
        acr: stored.grant.acr,
        auth_time: stored.grant.auth_time,
    })
    .into_response()
}

fn error_response(status: StatusCode, error: OAuthError) -> Response {
    (status, Json(error)).into_response()
}

fn redirect_with_error(redirect_uri: &str, error: AuthorizationError) -> Response {
    redirect_with_params(
        redirect_uri,
        &[
            ("error", Some(error.error.as_str())),
            ("error_description", error.error_description.as_deref()),
            ("state", error.state.as_deref()),
        ],
    )
}

/// Redirects to `redirect_uri` with the present parameters appended to its query.
fn redirect_with_params(redirect_uri: &str, params: &[(&str, Option<&str>)]) -> Response {
    match Url::parse(redirect_uri) {
        Ok(mut url) => {
            {
                let mut query = url.query_pairs_mut();
                for (name, value) in params {
                    if let Some(value) = value {
                        query.append_pair(name, value);
                    }
                }
            }
            Redirect::to(url.as_str()).into_response()
        }
        Err(_) => error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_request("Invalid redirect_uri"),
        ),
    }
}
