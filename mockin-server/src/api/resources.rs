use crate::api::authn_middleware::RequestMeta;
use crate::api::envelope::{Links, Meta, PageParams};
use crate::api::operation::{protect, LIST_RESOURCES};
use crate::errors::ApiError;
use crate::openapi::RESOURCES_TAG;
use crate::resources::{consented_resource_types, Resource};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::Uri,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ResourcesResponse {
    pub data: Vec<Resource>,
    pub links: Links,
    pub meta: Meta,
}

/// List the owner's resources covered by the consent
#[utoipa::path(
    get,
    path = "/open-insurance/resources/v2/resources",
    tag = RESOURCES_TAG,
    params(PageParams),
    responses(
        (status = 200, description = "Consented resources", body = ResourcesResponse),
        (status = 401, description = "Missing token or consent without RESOURCES_READ"),
    )
)]
pub async fn list_resources(
    State(state): State<AppState>,
    Extension(meta): Extension<RequestMeta>,
    Query(params): Query<PageParams>,
    uri: Uri,
) -> Result<Json<ResourcesResponse>, ApiError> {
    let consent_id = meta.consent_id.as_deref().unwrap_or_default();
    let consent = state.consents.fetch(consent_id, &meta.client_id).await?;

    let types = consented_resource_types(&consent.permissions);
    let page = params.paginate(state.resources.resources(&meta.subject, &types));
    let requested_url = state
        .config
        .url(uri.path_and_query().map_or(uri.path(), |pq| pq.as_str()));

    Ok(Json(ResourcesResponse {
        links: page.links(&requested_url),
        meta: page.meta(),
        data: page.records,
    }))
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().route(
        "/open-insurance/resources/v2/resources",
        protect(state, LIST_RESOURCES, get(list_resources)),
    )
}
