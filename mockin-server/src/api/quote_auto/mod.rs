//! Auto insurance quotes.
//!
//! A quote moves RCVD -> EVAL -> ACPT (or RJCT) one step per status read,
//! and the customer then acknowledges (ACKN) or cancels (CANC) it.

pub mod models;
pub mod service;

use crate::api::authn_middleware::RequestMeta;
use crate::api::envelope::{Links, Meta};
use crate::api::operation::{protect, CREATE_QUOTE_AUTO, PATCH_QUOTE_AUTO, QUOTE_AUTO_STATUS};
use crate::errors::ApiError;
use crate::openapi::QUOTE_AUTO_TAG;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use log::debug;
use models::{
    CreateQuoteRequest, CreateQuoteResponse, PatchQuoteRequest, PatchQuoteResponse,
    PatchQuoteResponseData, QuoteStatus, QuoteStatusInfo, QuoteStatusResponse, RedirectLinks,
};

const REQUEST_PATH: &str = "/open-insurance/quote-auto/v1/request";

fn status_path(consent_id: &str) -> String {
    format!("{REQUEST_PATH}/{consent_id}/quote-status")
}

fn ensure_token_consent(meta: &RequestMeta, consent_id: &str) -> Result<(), ApiError> {
    if meta.consent_id.as_deref() == Some(consent_id) {
        return Ok(());
    }
    debug!(
        "Quote consent {} differs from token consent {:?}",
        consent_id, meta.consent_id
    );
    Err(ApiError::bad_request("NAO_INFORMADO", "invalid consent id"))
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request("INVALID_REQUEST", rejection.body_text())
}

/// Request an auto insurance quote
#[utoipa::path(
    post,
    path = "/open-insurance/quote-auto/v1/request",
    tag = QUOTE_AUTO_TAG,
    request_body = CreateQuoteRequest,
    responses(
        (status = 201, description = "Quote received", body = CreateQuoteResponse),
        (status = 400, description = "Body consent differs from the token consent"),
        (status = 422, description = "Missing or reused idempotency key"),
    )
)]
pub async fn create_quote(
    State(state): State<AppState>,
    Extension(meta): Extension<RequestMeta>,
    payload: Result<Json<CreateQuoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateQuoteResponse>), ApiError> {
    let Json(request) = payload.map_err(invalid_body)?;
    ensure_token_consent(&meta, &request.data.consent_id)?;

    let quote = state.quotes.create(request.data).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateQuoteResponse {
            data: QuoteStatusInfo {
                status: quote.status,
                status_update_date_time: quote.updated_at,
            },
            links: Links::to_self(state.config.url(&status_path(&quote.consent_id))),
            meta: Meta::single(),
        }),
    ))
}

/// Fetch the quote status, advancing its evaluation
#[utoipa::path(
    get,
    path = "/open-insurance/quote-auto/v1/request/{consentId}/quote-status",
    tag = QUOTE_AUTO_TAG,
    params(("consentId" = String, Path, description = "Consent the quote was requested under")),
    responses(
        (status = 200, description = "Quote status", body = QuoteStatusResponse),
        (status = 404, description = "No quote for the consent"),
    )
)]
pub async fn quote_status(
    State(state): State<AppState>,
    Extension(meta): Extension<RequestMeta>,
    Path(consent_id): Path<String>,
) -> Result<Json<QuoteStatusResponse>, ApiError> {
    ensure_token_consent(&meta, &consent_id)?;

    let quote = state.quotes.status(&meta.client_id, &consent_id).await?;
    Ok(Json(QuoteStatusResponse {
        data: (&quote).into(),
        links: Links::to_self(state.config.url(&status_path(&consent_id))),
        meta: Meta::single(),
    }))
}

/// Acknowledge or cancel a quote
#[utoipa::path(
    patch,
    path = "/open-insurance/quote-auto/v1/request/{consentId}",
    tag = QUOTE_AUTO_TAG,
    params(("consentId" = String, Path, description = "Consent the quote was requested under")),
    request_body = PatchQuoteRequest,
    responses(
        (status = 200, description = "Quote updated", body = PatchQuoteResponse),
        (status = 404, description = "No quote for the consent"),
        (status = 422, description = "Only accepted quotes can be acknowledged"),
    )
)]
pub async fn patch_quote(
    State(state): State<AppState>,
    Extension(meta): Extension<RequestMeta>,
    Path(consent_id): Path<String>,
    payload: Result<Json<PatchQuoteRequest>, JsonRejection>,
) -> Result<Json<PatchQuoteResponse>, ApiError> {
    let Json(request) = payload.map_err(invalid_body)?;
    ensure_token_consent(&meta, &consent_id)?;

    let quote = state.quotes.patch(&consent_id, &request.data.status).await?;
    let data = match quote.status {
        QuoteStatus::Canc => PatchQuoteResponseData {
            status: quote.status,
            insurer_quote_id: None,
            links: None,
        },
        _ => PatchQuoteResponseData {
            status: quote.status,
            insurer_quote_id: Some(quote.id),
            links: Some(RedirectLinks {
                redirect: state.config.issuer(),
            }),
        },
    };
    Ok(Json(PatchQuoteResponse { data }))
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            REQUEST_PATH,
            protect(state, CREATE_QUOTE_AUTO, post(create_quote)),
        )
        .route(
            "/open-insurance/quote-auto/v1/request/{consent_id}/quote-status",
            protect(state, QUOTE_AUTO_STATUS, get(quote_status)),
        )
        .route(
            "/open-insurance/quote-auto/v1/request/{consent_id}",
            protect(state, PATCH_QUOTE_AUTO, patch(patch_quote)),
        )
}
