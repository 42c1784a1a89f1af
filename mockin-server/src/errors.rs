use axum::response::IntoResponse;
use axum::Json;
use consent_engine::ConsentError;
use http::StatusCode;
use log::error;
use serde_json::{json, Value};

const MAX_DETAIL_CHARS: usize = 255;

/// Error returned by the Open Insurance API surface.
///
/// Rendered as `{"errors":[{code,title,detail}],"meta":{...}}`. A 422 response
/// carries a single error object under `errors` instead of a list.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub code: String,
    pub detail: String,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with a code, a detail message and a status code
    pub fn new<C: ToString, S: ToString>(code: C, detail: S, status_code: StatusCode) -> Self {
        Self {
            code: code.to_string(),
            detail: detail.to_string(),
            status_code,
        }
    }

    /// Create new Internal Server Error (500). The detail is never shown to clients.
    pub fn internal() -> Self {
        Self::new(
            "INTERNAL_ERROR",
            "internal error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
    }

    /// Create new Bad Request Error (400)
    pub fn bad_request<C: ToString, S: ToString>(code: C, detail: S) -> Self {
        Self::new(code, detail, StatusCode::BAD_REQUEST)
    }

    /// Create new Unprocessable Entity Error (422)
    pub fn unprocessable<C: ToString, S: ToString>(code: C, detail: S) -> Self {
        Self::new(code, detail, StatusCode::UNPROCESSABLE_ENTITY)
    }

    /// Create new Unauthorized Error (401)
    pub fn unauthorized<C: ToString, S: ToString>(code: C, detail: S) -> Self {
        Self::new(code, detail, StatusCode::UNAUTHORIZED)
    }

    /// Create new Not Found Error (404)
    pub fn not_found<S: ToString>(detail: S) -> Self {
        Self::new("NOT_FOUND", detail, StatusCode::NOT_FOUND)
    }

    fn body(&self) -> Value {
        let detail: String = self.detail.chars().take(MAX_DETAIL_CHARS).collect();
        let error = json!({
            "code": self.code,
            "title": self.code,
            "detail": detail,
        });
        let errors = if self.status_code == StatusCode::UNPROCESSABLE_ENTITY {
            error
        } else {
            Value::Array(vec![error])
        };
        json!({
            "errors": errors,
            "meta": {
                "totalRecords": 1,
                "totalPages": 1,
            },
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code, Json(self.body())).into_response()
    }
}

impl From<ConsentError> for ApiError {
    fn from(err: ConsentError) -> Self {
        match &err {
            ConsentError::Validation(validation) => {
                let code = if validation.is_permission_rule() {
                    "INVALID_PERMISSION"
                } else {
                    "INVALID_REQUEST"
                };
                let status = if validation.is_unprocessable() {
                    StatusCode::UNPROCESSABLE_ENTITY
                } else {
                    StatusCode::BAD_REQUEST
                };
                Self::new(code, validation, status)
            }
            ConsentError::NotFound => Self::not_found(&err),
            ConsentError::Forbidden => Self::new("UNAUTHORIZED", &err, StatusCode::FORBIDDEN),
            ConsentError::InvalidStatus(_) => Self::bad_request("INVALID_STATUS", &err),
            ConsentError::InvalidOperation(_) => Self::bad_request("INVALID_OPERATION", &err),
            ConsentError::InvalidPermissions => Self::bad_request("INVALID_PERMISSIONS", &err),
            ConsentError::Internal(detail) => {
                error!("Internal consent error: {}", detail);
                Self::internal()
            }
        }
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        error!("Store error: {}", err);
        Self::internal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consent_engine::ValidationError;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let (status, body) = render(ApiError::bad_request("INVALID_STATUS", "bad status")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "errors": [{"code": "INVALID_STATUS", "title": "INVALID_STATUS", "detail": "bad status"}],
                "meta": {"totalRecords": 1, "totalPages": 1},
            })
        );
    }

    #[tokio::test]
    async fn test_unprocessable_uses_single_object() {
        let (status, body) = render(ApiError::unprocessable("ERRO_IDEMPOTENCIA", "mismatch")).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["code"], "ERRO_IDEMPOTENCIA");
    }

    #[tokio::test]
    async fn test_detail_is_truncated() {
        let (_, body) = render(ApiError::bad_request("X", "a".repeat(400))).await;
        assert_eq!(body["errors"][0]["detail"].as_str().unwrap().len(), 255);
    }

    #[test]
    fn test_consent_error_mapping() {
        let cases = [
            (
                ConsentError::from(ValidationError::MixedPhases),
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_PERMISSION",
            ),
            (
                ConsentError::from(ValidationError::AnchorAlone),
                StatusCode::BAD_REQUEST,
                "INVALID_PERMISSION",
            ),
            (
                ConsentError::from(ValidationError::ExpirationInPast),
                StatusCode::BAD_REQUEST,
                "INVALID_REQUEST",
            ),
            (ConsentError::NotFound, StatusCode::NOT_FOUND, "NOT_FOUND"),
            (ConsentError::Forbidden, StatusCode::FORBIDDEN, "UNAUTHORIZED"),
            (
                ConsentError::InvalidPermissions,
                StatusCode::BAD_REQUEST,
                "INVALID_PERMISSIONS",
            ),
            (
                ConsentError::Internal("disk on fire".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let api_error = ApiError::from(err);
            assert_eq!(api_error.status_code, status);
            assert_eq!(api_error.code, code);
        }
    }

    #[test]
    fn test_internal_detail_is_not_leaked() {
        let api_error = ApiError::from(ConsentError::Internal("redis://secret".to_string()));
        assert!(!api_error.detail.contains("secret"));
    }
}
