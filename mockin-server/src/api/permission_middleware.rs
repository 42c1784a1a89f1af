use crate::api::authn_middleware::RequestMeta;
use crate::api::operation::Operation;
use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use log::debug;

/// Verifies the consent bound to the access token is authorised and grants
/// the operation's permissions. Runs after authentication.
pub(crate) async fn permission_middleware(
    State(state): State<AppState>,
    Extension(operation): Extension<Operation>,
    request: Request,
    next: Next,
) -> Response {
    if operation.permissions.is_empty() {
        return next.run(request).await;
    }

    let Some(meta) = request.extensions().get::<RequestMeta>().cloned() else {
        debug!("No request metadata available for {}", operation.name);
        return invalid_consent();
    };
    let Some(consent_id) = meta.consent_id.as_deref() else {
        debug!("Token of client {} is not bound to a consent", meta.client_id);
        return invalid_consent();
    };

    if let Err(err) = state
        .consents
        .verify_permissions(consent_id, &meta.client_id, operation.permissions)
        .await
    {
        debug!(
            "Consent {} rejected for {}: {}",
            consent_id, operation.name, err
        );
        return invalid_consent();
    }

    next.run(request).await
}

fn invalid_consent() -> Response {
    ApiError::unauthorized("UNAUTHORIZED", "invalid consent").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;
    use axum::body::Body;
    use axum::routing::get;
    use axum::{middleware, Router};
    use chrono::Duration;
    use consent_engine::{ConsentRequest, Permission};
    use http::StatusCode;
    use tower::ServiceExt;

    const OPERATION: Operation = Operation {
        name: "Test",
        scopes: &[],
        permissions: &[Permission::CAPITALIZATION_TITLE_READ],
        idempotent: false,
        fapi_id_required: false,
    };

    fn app(state: AppState, meta: Option<RequestMeta>) -> Router {
        let mut router = Router::new()
            .route("/test", get(|| async { StatusCode::OK }))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                permission_middleware,
            ))
            .layer(Extension(OPERATION));
        if let Some(meta) = meta {
            router = router.layer(Extension(meta));
        }
        router.with_state(state)
    }

    fn meta(consent_id: Option<String>) -> RequestMeta {
        RequestMeta {
            client_id: "mockin_client".to_string(),
            subject: "bob@mail.com".to_string(),
            consent_id,
            scopes: Vec::new(),
        }
    }

    async fn status(router: Router) -> StatusCode {
        router
            .oneshot(
                axum::extract::Request::builder()
                    .uri("/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    async fn create_consent(state: &AppState, authorize: bool) -> String {
        let consent = state
            .consents
            .create(ConsentRequest {
                client_id: "mockin_client".to_string(),
                owner_tax_id: "78628584099".to_string(),
                business_tax_id: None,
                permissions: vec![
                    Permission::RESOURCES_READ,
                    Permission::CAPITALIZATION_TITLE_READ,
                ],
                expires_at: state.consents.now() + Duration::days(30),
                endorsement_request: None,
            })
            .await
            .unwrap();
        if authorize {
            state
                .consents
                .authorize(&consent.id, consent.permissions.clone())
                .await
                .unwrap();
        }
        consent.id
    }

    #[tokio::test]
    async fn test_authorised_consent_passes() {
        let state = test_state();
        let id = create_consent(&state, true).await;
        assert_eq!(status(app(state, Some(meta(Some(id))))).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_awaiting_consent_is_rejected() {
        let state = test_state();
        let id = create_consent(&state, false).await;
        assert_eq!(
            status(app(state, Some(meta(Some(id))))).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_token_without_consent_is_rejected() {
        let state = test_state();
        assert_eq!(
            status(app(state.clone(), Some(meta(None)))).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status(app(state, None)).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_other_client_is_rejected() {
        let state = test_state();
        let id = create_consent(&state, true).await;
        let mut other = meta(Some(id));
        other.client_id = "someone_else".to_string();
        assert_eq!(status(app(state, Some(other))).await, StatusCode::UNAUTHORIZED);
    }
}
