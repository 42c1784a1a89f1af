//! Static descriptions of the protected Open Insurance operations and the
//! middleware stack that enforces them.

use crate::api::authn_middleware::authentication_middleware;
use crate::api::idempotency::idempotency_middleware;
use crate::api::permission_middleware::permission_middleware;
use crate::headers::{interaction_id_middleware, no_cache_middleware};
use crate::state::AppState;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::MethodRouter;
use axum::Extension;
use std::convert::Infallible;
use consent_engine::Permission;

/// What a protected operation requires from the caller.
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    pub name: &'static str,
    /// Every scope must be present on the access token. `consent` is matched
    /// by any `consent:<id>` scope.
    pub scopes: &'static [&'static str],
    /// Checked against the consent bound to the token; empty means no check.
    pub permissions: &'static [Permission],
    pub idempotent: bool,
    pub fapi_id_required: bool,
}

pub const CREATE_CONSENT: Operation = Operation {
    name: "CreateConsentV2",
    scopes: &["consents"],
    permissions: &[],
    idempotent: false,
    fapi_id_required: false,
};

pub const FETCH_CONSENT: Operation = Operation {
    name: "ConsentV2",
    scopes: &["consents"],
    permissions: &[],
    idempotent: false,
    fapi_id_required: false,
};

pub const DELETE_CONSENT: Operation = Operation {
    name: "DeleteConsentV2",
    scopes: &["consents"],
    permissions: &[],
    idempotent: false,
    fapi_id_required: false,
};

pub const LIST_RESOURCES: Operation = Operation {
    name: "ResourcesV2",
    scopes: &["openid", "consent", "resources"],
    permissions: &[Permission::RESOURCES_READ],
    idempotent: false,
    fapi_id_required: false,
};

pub const CREATE_ENDORSEMENT: Operation = Operation {
    name: "CreateEndorsementV1",
    scopes: &["openid", "consent", "endorsement"],
    permissions: &[Permission::ENDORSEMENT_REQUEST_CREATE],
    idempotent: true,
    fapi_id_required: true,
};

pub const CREATE_QUOTE_AUTO: Operation = Operation {
    name: "CreateQuoteAutoV1",
    scopes: &["openid", "consent", "quote-auto"],
    permissions: &[Permission::QUOTE_AUTO_CREATE],
    idempotent: true,
    fapi_id_required: false,
};

pub const QUOTE_AUTO_STATUS: Operation = Operation {
    name: "QuoteAutoStatusV1",
    scopes: &["openid", "consent", "quote-auto"],
    permissions: &[Permission::QUOTE_AUTO_READ],
    idempotent: false,
    fapi_id_required: false,
};

pub const PATCH_QUOTE_AUTO: Operation = Operation {
    name: "PatchQuoteAutoV1",
    scopes: &["openid", "consent", "quote-auto"],
    permissions: &[Permission::QUOTE_AUTO_UPDATE],
    idempotent: false,
    fapi_id_required: false,
};

/// Wraps a route with the protected-operation pipeline.
///
/// Requests pass interaction id, cache headers, authentication, idempotency
/// and permissions in that order. A replayed response skips the permission
/// check, so a retry still succeeds after the first call consumed the consent.
pub(crate) fn protect(
    state: &AppState,
    operation: Operation,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    route
        .layer(from_fn_with_state(state.clone(), permission_middleware))
        .layer(from_fn_with_state(state.clone(), idempotency_middleware))
        .layer(from_fn_with_state(state.clone(), authentication_middleware))
        .layer(from_fn(no_cache_middleware))
        .layer::<_, Infallible>(from_fn(interaction_id_middleware))
        .layer(Extension(operation))
}
