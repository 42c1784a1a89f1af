use crate::openapi::HEALTH_TAG;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Basic health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Health {
    status: &'static str,
    details: Option<Value>,
    #[serde(skip)]
    status_code: StatusCode,
}

impl Health {
    fn ok(details: Option<Value>) -> Self {
        Self {
            status: "ok",
            details,
            status_code: StatusCode::OK,
        }
    }

    fn unavailable(error: &str) -> Self {
        Self {
            status: "error",
            details: Some(serde_json::json!({ "error": error })),
            status_code: StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for Health {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "status": self.status
        });

        if let Some(Value::Object(obj)) = self.details {
            for (key, value) in obj {
                body[key] = value;
            }
        }

        (self.status_code, axum::Json(body)).into_response()
    }
}

/// Liveness check, always ok while the process serves requests
#[utoipa::path(
    get,
    path = "/health",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is alive", body = Health)
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Health::ok(None)
}

/// Readiness check handler
#[utoipa::path(
    get,
    path = "/ready",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is ready", body = Health),
        (status = 503, description = "The store is unreachable", body = Health)
    )
)]
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.health_check().await {
        Health::ok(Some(serde_json::json!({ "store_status": "healthy" })))
    } else {
        Health::unavailable("The store is not healthy")
    }
}

/// Startup check handler
#[utoipa::path(
    get,
    path = "/startup",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service has started", body = Health),
        (status = 503, description = "Service is still starting", body = Health)
    )
)]
pub async fn startup_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.health_check().await {
        Health::ok(Some(serde_json::json!({ "initialized": true })))
    } else {
        Health::unavailable("Service initialization incomplete")
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/startup", get(startup_check))
}
