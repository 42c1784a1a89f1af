use crate::api::authn_middleware::RequestMeta;
use crate::api::envelope::{date_time, Links, Meta};
use crate::api::operation::{protect, CREATE_CONSENT, DELETE_CONSENT, FETCH_CONSENT};
use crate::errors::ApiError;
use crate::openapi::CONSENTS_TAG;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use consent_engine::{
    Consent, ConsentRequest, ConsentStatus, EndorsementRequest, EndorsementType, Permission,
    RejectedBy, RejectionReason,
};
use log::debug;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const CONSENTS_PATH: &str = "/open-insurance/consents/v2/consents";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub identification: String,
    pub rel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentHolder {
    pub document: Document,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndorsementInformation {
    pub policy_number: String,
    #[schema(value_type = String, example = "ALTERACAO")]
    pub endorsement_type: EndorsementType,
    pub request_description: String,
}

impl From<EndorsementInformation> for EndorsementRequest {
    fn from(info: EndorsementInformation) -> Self {
        Self {
            policy_number: info.policy_number,
            endorsement_type: info.endorsement_type,
            description: info.request_description,
        }
    }
}

impl From<&EndorsementRequest> for EndorsementInformation {
    fn from(request: &EndorsementRequest) -> Self {
        Self {
            policy_number: request.policy_number.clone(),
            endorsement_type: request.endorsement_type,
            request_description: request.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsentData {
    pub logged_user: DocumentHolder,
    pub business_entity: Option<DocumentHolder>,
    #[schema(value_type = Vec<String>, example = json!(["RESOURCES_READ", "CUSTOMERS_PERSONAL_IDENTIFICATIONS_READ"]))]
    pub permissions: Vec<Permission>,
    pub expiration_date_time: DateTime<Utc>,
    pub endorsement_information: Option<EndorsementInformation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateConsentRequest {
    pub data: CreateConsentData,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RejectionReasonCode {
    #[schema(value_type = String, example = "CUSTOMER_MANUALLY_REJECTED")]
    pub code: RejectionReason,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRejection {
    #[schema(value_type = String, example = "USER")]
    pub rejected_by: RejectedBy,
    pub reason: RejectionReasonCode,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsentData {
    pub consent_id: String,
    #[schema(value_type = String, example = "AWAITING_AUTHORISATION")]
    pub status: ConsentStatus,
    #[schema(value_type = Vec<String>)]
    pub permissions: Vec<Permission>,
    #[serde(serialize_with = "date_time")]
    pub creation_date_time: DateTime<Utc>,
    #[serde(serialize_with = "date_time")]
    pub status_update_date_time: DateTime<Utc>,
    #[serde(serialize_with = "date_time")]
    pub expiration_date_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<ConsentRejection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endorsement_information: Option<EndorsementInformation>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConsentResponse {
    pub data: ConsentData,
    pub links: Links,
    pub meta: Meta,
}

impl ConsentResponse {
    fn new(consent: Consent, state: &AppState) -> Self {
        let links = Links::to_self(state.config.url(&format!("{CONSENTS_PATH}/{}", consent.id)));
        let data = ConsentData {
            rejection: consent.rejection.map(|rejection| ConsentRejection {
                rejected_by: rejection.rejected_by,
                reason: RejectionReasonCode {
                    code: rejection.reason,
                },
            }),
            endorsement_information: consent.endorsement_request.as_ref().map(Into::into),
            consent_id: consent.id,
            status: consent.status,
            permissions: consent.permissions,
            creation_date_time: consent.created_at,
            status_update_date_time: consent.updated_at,
            expiration_date_time: consent.expires_at,
        };
        Self {
            data,
            links,
            meta: Meta::single(),
        }
    }
}

/// Create a consent awaiting the resource owner's authorization
#[utoipa::path(
    post,
    path = "/open-insurance/consents/v2/consents",
    tag = CONSENTS_TAG,
    request_body = CreateConsentRequest,
    responses(
        (status = 201, description = "Consent created", body = ConsentResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Permissions cannot be requested together"),
    )
)]
pub async fn create_consent(
    State(state): State<AppState>,
    Extension(meta): Extension<RequestMeta>,
    payload: Result<Json<CreateConsentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConsentResponse>), ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Malformed consent request: {}", rejection.body_text());
        ApiError::bad_request("INVALID_REQUEST", rejection.body_text())
    })?;
    let data = request.data;

    let consent = state
        .consents
        .create(ConsentRequest {
            client_id: meta.client_id,
            owner_tax_id: data.logged_user.document.identification,
            business_tax_id: data
                .business_entity
                .map(|entity| entity.document.identification),
            permissions: data.permissions,
            expires_at: data.expiration_date_time,
            endorsement_request: data.endorsement_information.map(Into::into),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ConsentResponse::new(consent, &state)),
    ))
}

/// Fetch a consent, applying any pending expiration
#[utoipa::path(
    get,
    path = "/open-insurance/consents/v2/consents/{consentId}",
    tag = CONSENTS_TAG,
    params(("consentId" = String, Path, description = "Consent identifier")),
    responses(
        (status = 200, description = "Consent found", body = ConsentResponse),
        (status = 403, description = "Consent belongs to another client"),
        (status = 404, description = "Consent not found"),
    )
)]
pub async fn fetch_consent(
    State(state): State<AppState>,
    Extension(meta): Extension<RequestMeta>,
    Path(consent_id): Path<String>,
) -> Result<Json<ConsentResponse>, ApiError> {
    let consent = state.consents.fetch(&consent_id, &meta.client_id).await?;
    Ok(Json(ConsentResponse::new(consent, &state)))
}

/// Revoke or reject a consent on behalf of the user
#[utoipa::path(
    delete,
    path = "/open-insurance/consents/v2/consents/{consentId}",
    tag = CONSENTS_TAG,
    params(("consentId" = String, Path, description = "Consent identifier")),
    responses(
        (status = 204, description = "Consent rejected"),
        (status = 400, description = "Consent already rejected or consumed"),
        (status = 404, description = "Consent not found"),
    )
)]
pub async fn delete_consent(
    State(state): State<AppState>,
    Extension(meta): Extension<RequestMeta>,
    Path(consent_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.consents.revoke(&consent_id, &meta.client_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            CONSENTS_PATH,
            protect(state, CREATE_CONSENT, post(create_consent)),
        )
        .route(
            "/open-insurance/consents/v2/consents/{consent_id}",
            protect(state, FETCH_CONSENT, get(fetch_consent))
                .merge(protect(state, DELETE_CONSENT, delete(delete_consent))),
        )
}
