use crate::api::authn_middleware::RequestMeta;
use crate::api::envelope::{date_time, Links, Meta};
use crate::api::operation::{protect, CREATE_ENDORSEMENT};
use crate::errors::ApiError;
use crate::openapi::ENDORSEMENT_TAG;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use consent_engine::{Consent, EndorsementType};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

const NOT_INFORMED: &str = "NAO_INFORMADO";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndorsementRequestData {
    pub policy_number: String,
    #[schema(value_type = String, example = "ALTERACAO")]
    pub endorsement_type: EndorsementType,
    pub request_description: String,
    /// Defaults to the current date
    pub request_date: Option<NaiveDate>,
    #[schema(value_type = Option<Object>)]
    pub custom_data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateEndorsementRequest {
    pub data: EndorsementRequestData,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndorsementData {
    pub protocol_number: String,
    #[serde(serialize_with = "date_time")]
    pub protocol_date_time: DateTime<Utc>,
    pub policy_number: String,
    #[schema(value_type = String)]
    pub endorsement_type: EndorsementType,
    pub request_description: String,
    pub request_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub custom_data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EndorsementResponse {
    pub data: EndorsementData,
    pub links: Links,
    pub meta: Meta,
}

/// Request an endorsement on a consented policy, consuming the consent
#[utoipa::path(
    post,
    path = "/open-insurance/endorsement/v1/request/{consentId}",
    tag = ENDORSEMENT_TAG,
    params(("consentId" = String, Path, description = "Consent authorising the endorsement")),
    request_body = CreateEndorsementRequest,
    responses(
        (status = 201, description = "Endorsement requested", body = EndorsementResponse),
        (status = 400, description = "Path consent differs from the token consent"),
        (status = 422, description = "Endorsement does not match the consent"),
    )
)]
pub async fn create_endorsement(
    State(state): State<AppState>,
    Extension(meta): Extension<RequestMeta>,
    Path(consent_id): Path<String>,
    payload: Result<Json<CreateEndorsementRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EndorsementResponse>), ApiError> {
    let Json(request) = payload
        .map_err(|rejection| ApiError::bad_request("INVALID_REQUEST", rejection.body_text()))?;

    if meta.consent_id.as_deref() != Some(consent_id.as_str()) {
        debug!(
            "Endorsement path consent {} differs from token consent {:?}",
            consent_id, meta.consent_id
        );
        return Err(ApiError::bad_request(NOT_INFORMED, "invalid consent id"));
    }

    let consent = state
        .consents
        .fetch_and_consume(&consent_id, &meta.client_id)
        .await?;
    let data = request.data;
    validate(&state, &meta, &consent, &data)?;

    let now = state.clock.now();
    let endorsement = EndorsementData {
        protocol_number: Uuid::new_v4().to_string(),
        protocol_date_time: now,
        policy_number: data.policy_number,
        endorsement_type: data.endorsement_type,
        request_description: data.request_description,
        request_date: data.request_date.unwrap_or_else(|| now.date_naive()),
        custom_data: data.custom_data,
    };
    info!(
        "Created endorsement {} for policy {} under consent {}",
        endorsement.protocol_number, endorsement.policy_number, consent_id
    );

    let links = Links::to_self(
        state
            .config
            .url(&format!("/open-insurance/endorsement/v1/request/{consent_id}")),
    );
    Ok((
        StatusCode::CREATED,
        Json(EndorsementResponse {
            data: endorsement,
            links,
            meta: Meta::single(),
        }),
    ))
}

fn validate(
    state: &AppState,
    meta: &RequestMeta,
    consent: &Consent,
    data: &EndorsementRequestData,
) -> Result<(), ApiError> {
    let consented = consent.endorsement_request.as_ref();
    if consented.map(|e| e.policy_number.as_str()) != Some(data.policy_number.as_str()) {
        return Err(ApiError::unprocessable(
            NOT_INFORMED,
            "policy number not consented",
        ));
    }
    if consented.map(|e| e.endorsement_type) != Some(data.endorsement_type) {
        return Err(ApiError::unprocessable(
            NOT_INFORMED,
            "endorsement type not consented",
        ));
    }
    if state
        .resources
        .find(&meta.subject, &data.policy_number)
        .is_none()
    {
        return Err(ApiError::unprocessable(NOT_INFORMED, "policy number not found"));
    }
    Ok(())
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().route(
        "/open-insurance/endorsement/v1/request/{consent_id}",
        protect(state, CREATE_ENDORSEMENT, post(create_endorsement)),
    )
}
