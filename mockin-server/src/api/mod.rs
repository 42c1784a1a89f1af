mod authn_middleware;
pub(crate) mod consents;
pub(crate) mod endorsement;
pub(crate) mod envelope;
pub(crate) mod health;
pub(crate) mod idempotency;
pub(crate) mod oauth;
pub(crate) mod operation;
mod permission_middleware;
pub(crate) mod quote_auto;
pub(crate) mod resources;

use crate::state::AppState;
use axum::Router;

/// Combines all API routes into a single router.
///
/// Open Insurance operations wrap themselves in the protected-operation
/// pipeline, see [`operation::protect`].
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(oauth::router())
        .merge(consents::router(state))
        .merge(resources::router(state))
        .merge(endorsement::router(state))
        .merge(quote_auto::router(state))
}
