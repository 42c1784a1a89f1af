//! Replay protection for mutating operations keyed by `x-idempotency-key`.
//!
//! Records are scoped to the authenticated client.

use crate::api::authn_middleware::RequestMeta;
use crate::api::operation::Operation;
use crate::errors::ApiError;
use crate::state::AppState;
use crate::store::{DocumentStore, Store, StoreError};
use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const IDEMPOTENCY_KEY: &str = "x-idempotency-key";

const IDEMPOTENCY_ERROR: &str = "ERRO_IDEMPOTENCIA";
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// A completed request and the response it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// SHA-256 of the raw request body, hex encoded
    pub request_digest: String,
    pub response: String,
}

#[derive(Clone)]
pub struct IdempotencyStore {
    store: Store,
}

impl IdempotencyStore {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    fn key(client_id: &str, idempotency_key: &str) -> String {
        format!("idempotency:{}:{}", client_id, idempotency_key)
    }

    pub async fn get(
        &self,
        client_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<IdempotencyRecord>, StoreError> {
        self.store.get(&Self::key(client_id, idempotency_key)).await
    }

    pub async fn save(
        &self,
        client_id: &str,
        idempotency_key: &str,
        record: &IdempotencyRecord,
    ) -> Result<(), StoreError> {
        self.store
            .set(&Self::key(client_id, idempotency_key), record)
            .await
    }
}

fn digest(body: &[u8]) -> String {
    Sha256::digest(body)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

pub(crate) async fn idempotency_middleware(
    State(state): State<AppState>,
    Extension(operation): Extension<Operation>,
    request: Request,
    next: Next,
) -> Response {
    if !operation.idempotent {
        return next.run(request).await;
    }

    let Some(client_id) = request
        .extensions()
        .get::<RequestMeta>()
        .map(|meta| meta.client_id.clone())
    else {
        warn!("No authenticated client for {}", operation.name);
        return ApiError::unauthorized("UNAUTHORISED", "missing token").into_response();
    };

    let Some(key) = request
        .headers()
        .get(IDEMPOTENCY_KEY)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
    else {
        return ApiError::unprocessable(IDEMPOTENCY_ERROR, "missing idempotency id header")
            .into_response();
    };

    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(err) => {
            debug!("Failed to read request body: {}", err);
            return ApiError::bad_request("INVALID_REQUEST", "could not read the request body")
                .into_response();
        }
    };
    let request_digest = digest(&body);
    let replay_status = if parts.method == Method::POST {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    match state.idempotency.get(&client_id, &key).await {
        Ok(Some(record)) if record.request_digest == request_digest => {
            info!("Replaying response for idempotency key {}", key);
            return (
                replay_status,
                [(CONTENT_TYPE, "application/json")],
                record.response,
            )
                .into_response();
        }
        Ok(Some(_)) => {
            debug!("Idempotency key {} reused with a different request", key);
            return ApiError::unprocessable(
                IDEMPOTENCY_ERROR,
                "the idempotency key was already used with a different request body",
            )
            .into_response();
        }
        Ok(None) => {}
        Err(err) => return ApiError::from(err).into_response(),
    }

    let response = next.run(Request::from_parts(parts, Body::from(body))).await;
    if !response.status().is_success() {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes: Bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("Failed to buffer response for idempotency key {}: {}", key, err);
            return ApiError::internal().into_response();
        }
    };
    match String::from_utf8(bytes.to_vec()) {
        Ok(response) => {
            let record = IdempotencyRecord {
                request_digest,
                response,
            };
            if let Err(err) = state.idempotency.save(&client_id, &key, &record).await {
                error!("Failed to save idempotency record {}: {}", key, err);
            }
        }
        Err(_) => debug!("Response for idempotency key {} is not text, not cached", key),
    }
    Response::from_parts(parts, Body::from(bytes))
}
