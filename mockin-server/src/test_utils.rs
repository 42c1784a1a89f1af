use crate::api::oauth::models::GrantInfo;
use crate::config::MockinConfig;
use crate::create_app;
use crate::state::AppState;
use crate::store::memory::InMemoryStore;
use crate::store::Store;
use axum::body::Body;
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use consent_engine::{Clock, ConsentRequest, EndorsementRequest, ManualClock, Permission};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use url::form_urlencoded;

pub const CLIENT_ID: &str = "mockin_client";
pub const CLIENT_SECRET: &str = "mockin_secret";
pub const REDIRECT_URI: &str = "https://localhost.emobix.co.uk:8443/test/a/mockin/callback";

const OWNER_USERNAME: &str = "bob@mail.com";
const OWNER_TAX_ID: &str = "78628584099";

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
        .single()
        .expect("valid start time")
}

fn build_state(config: MockinConfig) -> (AppState, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_time()));
    let store = Store::InMemory(InMemoryStore::new(0, 16).expect("Failed to create store"));
    let state = AppState::with_clock(config, store, clock.clone())
        .expect("Failed to initialize application state");
    (state, clock)
}

/// Application state over an in-memory store and a manual clock.
pub fn test_state() -> AppState {
    test_state_with_clock().0
}

/// Like [`test_state`], also returning the clock so tests can move time.
pub fn test_state_with_clock() -> (AppState, Arc<ManualClock>) {
    build_state(MockinConfig::for_test())
}

/// Test fixture for exercising the whole application through its router.
///
/// The fixture wires the real router over an in-memory store, the mock users
/// and resources, and a [`ManualClock`] starting at 2026-01-01 12:00 UTC.
/// Helpers cover the OAuth endpoints and the common consent setups so tests
/// can focus on the operation under test.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///
///     // A consent authorised by Bob and a token bound to it
///     let (consent_id, token) = fixture
///         .authorised_token(&["RESOURCES_READ", "CAPITALIZATION_TITLE_READ"], "openid resources")
///         .await;
///
///     let response = fixture
///         .get_with_token("/open-insurance/resources/v2/resources", &token)
///         .await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// State shared with the router, for direct service calls
    pub state: AppState,
    /// The clock behind every service
    pub clock: Arc<ManualClock>,
}

impl TestFixture {
    /// Creates a fixture with the test configuration.
    pub async fn new() -> Self {
        Self::with_config(MockinConfig::for_test()).await
    }

    /// Creates a fixture whose client receives webhook notifications at `uri`.
    pub async fn with_webhook(uri: &str) -> Self {
        let mut config = MockinConfig::for_test();
        config.oauth.client.webhook_uri = Some(uri.to_string());
        Self::with_config(config).await
    }

    async fn with_config(config: MockinConfig) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let (state, clock) = build_state(config);
        let app = create_app(state.clone()).await;
        Self { app, state, clock }
    }

    /// Initializes the test logger with the given level.
    ///
    /// Called by the constructors with `Debug`. Only the first call in a test
    /// binary takes effect.
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Creates a request builder, with a bearer token when one is given.
    pub fn request_builder(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        token: Option<&str>,
    ) -> http::request::Builder {
        let builder = Request::builder().method(method).uri(uri.as_ref());
        match token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// Sends an unauthenticated GET request.
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri, None)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a GET request with a bearer token.
    pub async fn get_with_token(&self, uri: impl AsRef<str>, token: &str) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri, Some(token))
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a DELETE request with a bearer token.
    pub async fn delete_with_token(&self, uri: impl AsRef<str>, token: &str) -> TestResponse {
        let request = self
            .request_builder(Method::DELETE, uri, Some(token))
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a form-encoded POST request, the way browsers and OAuth clients do.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let response = fixture
    ///     .post_form("/auth/introspect", &[("token", access_token.as_str())])
    ///     .await;
    /// assert_eq!(response.json["active"], true);
    /// ```
    pub async fn post_form(&self, uri: impl AsRef<str>, form: &[(&str, &str)]) -> TestResponse {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        let request = self
            .request_builder(Method::POST, uri, None)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a JSON POST request with a bearer token and extra headers.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let response = fixture
    ///     .post_with_token(&path, &body, &token, &[(IDEMPOTENCY_KEY, "key-1")])
    ///     .await;
    /// response.assert_status(StatusCode::CREATED);
    /// ```
    pub async fn post_with_token<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        token: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        self.send_json(Method::POST, uri, body, token, headers).await
    }

    /// Sends a JSON PATCH request with a bearer token.
    pub async fn patch_with_token<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        token: &str,
    ) -> TestResponse {
        self.send_json(Method::PATCH, uri, body, token, &[]).await
    }

    async fn send_json<T: Serialize>(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        body: &T,
        token: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let mut builder = self
            .request_builder(method, uri, Some(token))
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::from(json_body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a request and returns a TestResponse.
    ///
    /// The body is kept as text, and parsed as JSON when possible. Non-JSON
    /// bodies (HTML pages, empty responses) leave `json` as an empty object.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| json!({}))
        } else {
            json!({})
        };
        let text = String::from_utf8_lossy(&body).into_owned();

        TestResponse {
            status,
            json,
            text,
            headers,
        }
    }

    /// Obtains a client credentials token for the default client.
    pub async fn client_token(&self, scope: &str) -> String {
        let response = self
            .post_form(
                "/auth/token",
                &[
                    ("grant_type", "client_credentials"),
                    ("client_id", CLIENT_ID),
                    ("client_secret", CLIENT_SECRET),
                    ("scope", scope),
                ],
            )
            .await;
        response.assert_ok();
        response.json["access_token"]
            .as_str()
            .expect("token response without access_token")
            .to_string()
    }

    /// Creates a consent for Bob through the consents API, valid for one hour.
    pub async fn create_consent(&self, permissions: &[&str]) -> String {
        let token = self.client_token("consents").await;
        let body = json!({
            "data": {
                "loggedUser": {"document": {"identification": OWNER_TAX_ID, "rel": "CPF"}},
                "permissions": permissions,
                "expirationDateTime": (self.now() + Duration::hours(1))
                    .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            }
        });
        let response = self
            .post_with_token("/open-insurance/consents/v2/consents", &body, &token, &[])
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json["data"]["consentId"]
            .as_str()
            .expect("consent response without consentId")
            .to_string()
    }

    /// Fetches a consent through the consents API.
    pub async fn fetch_consent(&self, consent_id: &str) -> TestResponse {
        let token = self.client_token("consents").await;
        self.get_with_token(
            format!("/open-insurance/consents/v2/consents/{consent_id}"),
            &token,
        )
        .await
    }

    /// Starts the authorization code flow for the default client.
    pub async fn start_authorization(&self, scope: &str, state: Option<&str>) -> TestResponse {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("response_type", "code")
            .append_pair("client_id", CLIENT_ID)
            .append_pair("redirect_uri", REDIRECT_URI)
            .append_pair("scope", scope);
        if let Some(state) = state {
            query.append_pair("state", state);
        }
        self.get(format!("/auth/authorize?{}", query.finish())).await
    }

    /// Extracts the path a login or consent page posts back to.
    pub fn callback_path(&self, html: &str) -> String {
        let start = html.find("action=\"").expect("page without form action") + "action=\"".len();
        let end = html[start..].find('"').expect("unterminated form action") + start;
        let action = &html[start..end];
        action
            .strip_prefix(self.state.config.host.trim_end_matches('/'))
            .unwrap_or(action)
            .to_string()
    }

    /// Creates a consent, authorises it as Bob and issues a token bound to it.
    ///
    /// `extra_scopes` are added to the token next to `consent:<id>`.
    pub async fn authorised_token(&self, permissions: &[&str], extra_scopes: &str) -> (String, String) {
        let permissions = permissions.iter().map(|p| Permission::from(*p)).collect();
        self.authorise(permissions, None, extra_scopes).await
    }

    /// Like [`TestFixture::authorised_token`] for an endorsement consent.
    pub async fn authorised_endorsement_token(&self, request: EndorsementRequest) -> (String, String) {
        self.authorise(
            vec![Permission::ENDORSEMENT_REQUEST_CREATE],
            Some(request),
            "openid endorsement",
        )
        .await
    }

    async fn authorise(
        &self,
        permissions: Vec<Permission>,
        endorsement_request: Option<EndorsementRequest>,
        extra_scopes: &str,
    ) -> (String, String) {
        let consents = &self.state.consents;
        let consent = consents
            .create(ConsentRequest {
                client_id: CLIENT_ID.to_string(),
                owner_tax_id: OWNER_TAX_ID.to_string(),
                business_tax_id: None,
                permissions: permissions.clone(),
                expires_at: self.now() + Duration::hours(1),
                endorsement_request,
            })
            .await
            .expect("Failed to create consent");
        consents
            .authorize(&consent.id, permissions)
            .await
            .expect("Failed to authorise consent");

        let mut scopes: Vec<String> = extra_scopes.split_whitespace().map(str::to_string).collect();
        scopes.push(format!("consent:{}", consent.id));
        let grant = GrantInfo {
            subject: OWNER_USERNAME.to_string(),
            client_id: CLIENT_ID.to_string(),
            scopes,
            acr: None,
            auth_time: None,
        };
        let (token, _) = self
            .state
            .tokens
            .generate_token(grant)
            .await
            .expect("Failed to issue token");
        (consent.id, token)
    }
}

/// Response from a test request that provides convenient access to status,
/// headers and body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
    /// Raw response body
    pub text: String,
    pub headers: HeaderMap,
}

impl TestResponse {
    /// Checks if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns a header value, if present and valid text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match, printing the body.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {} but got {} with body: {}",
            expected, self.status, self.text
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }
}
