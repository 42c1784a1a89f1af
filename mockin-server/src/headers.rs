use crate::api::operation::Operation;
use crate::errors::ApiError;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use http::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use log::debug;
use uuid::Uuid;

pub const FAPI_INTERACTION_ID: &str = "x-fapi-interaction-id";

/// Cache-Control directives
#[derive(Debug, Clone, Default)]
pub struct CacheControl {
    pub no_cache: bool,
    pub no_store: bool,
}

impl CacheControl {
    /// Create a new CacheControl instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Set no-cache directive
    pub fn no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    /// Set no-store directive
    pub fn no_store(mut self) -> Self {
        self.no_store = true;
        self
    }

    /// Convert to HeaderValue
    pub fn to_header_value(&self) -> HeaderValue {
        let mut parts = Vec::new();

        if self.no_cache {
            parts.push("no-cache");
        }
        if self.no_store {
            parts.push("no-store");
        }

        HeaderValue::from_str(&parts.join(", ")).unwrap_or(HeaderValue::from_static(""))
    }
}

/// Helper struct for setting cache-related headers
#[derive(Debug, Clone, Default)]
pub struct CacheHeaders {
    cache_control: CacheControl,
}

impl CacheHeaders {
    /// Responses that must never be cached by the client or intermediaries
    pub fn no_store() -> Self {
        Self {
            cache_control: CacheControl::new().no_cache().no_store(),
        }
    }

    /// Apply headers to a response
    pub fn apply<B>(&self, response: &mut axum::response::Response<B>) {
        let headers = response.headers_mut();

        headers.insert(CACHE_CONTROL, self.cache_control.to_header_value());

        if self.cache_control.no_cache {
            headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        }
        if self.cache_control.no_store || self.cache_control.no_cache {
            headers.insert(EXPIRES, HeaderValue::from_static("0"));
        }
    }
}

/// Marks every Open Insurance response as non-cacheable.
pub(crate) async fn no_cache_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    CacheHeaders::no_store().apply(&mut response);
    response
}

/// Propagates the FAPI interaction id.
///
/// A missing or malformed id is replaced by a fresh one, unless the operation
/// requires a valid id from the client. The id is always echoed back.
pub(crate) async fn interaction_id_middleware(
    Extension(operation): Extension<Operation>,
    request: Request,
    next: Next,
) -> Response {
    let sent = request
        .headers()
        .get(FAPI_INTERACTION_ID)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok());

    let interaction_id = sent.unwrap_or_else(Uuid::new_v4);
    let mut response = if sent.is_none() && operation.fapi_id_required {
        debug!("Operation {} called without a valid interaction id", operation.name);
        ApiError::unprocessable(
            "INVALID_INTERACTION_ID",
            "the x-fapi-interaction-id header is missing or invalid",
        )
        .into_response()
    } else {
        next.run(request).await
    };

    if let Ok(value) = HeaderValue::from_str(&interaction_id.to_string()) {
        response.headers_mut().insert(FAPI_INTERACTION_ID, value);
    }
    response
}
