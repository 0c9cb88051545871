use crate::config::GateConfig;
use crate::create_app;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Bearer token sent by [`TestFixture::get`]
pub const TEST_TOKEN: &str = "test-access-token";

/// Test fixture running the full application against a mocked token info endpoint.
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///     fixture
///         .add_token_info_mock(json!({"scope": ["uid"], "uid": "jdoe"}), StatusCode::OK, 1)
///         .await;
///
///     let response = fixture.get("/me").await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration the application was built from
    pub config: GateConfig,
    /// Mock server standing in for the token info endpoint
    pub token_info_mock: MockServer,
}

impl TestFixture {
    /// Creates a fixture with the default test configuration
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Creates a fixture, letting `customize` adjust the configuration before
    /// the application is built
    pub async fn with_config(customize: impl FnOnce(&mut GateConfig)) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let token_info_mock = MockServer::start().await;
        let mut config = GateConfig::for_test_with_mocks(&token_info_mock);
        customize(&mut config);

        let state = AppState::new(config.clone()).expect("Failed to create application state");
        let app = create_app(state);

        Self {
            app,
            config,
            token_info_mock,
        }
    }

    /// Initializes the test logger; repeated calls are ignored
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Request builder carrying [`TEST_TOKEN`] as bearer token
    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header("Authorization", format!("Bearer {}", TEST_TOKEN))
    }

    /// Sends an authenticated GET request
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a GET request without an `Authorization` header
    pub async fn get_anonymous(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri.as_ref())
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request and collects status and JSON body
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Empty or non-JSON bodies become an empty object
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse { status, json }
    }

    /// Answers token info lookups for [`TEST_TOKEN`] with `response_body`,
    /// expecting exactly `expected_calls` lookups
    pub async fn add_token_info_mock(
        &self,
        response_body: impl Serialize,
        status_code: StatusCode,
        expected_calls: u64,
    ) {
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/oauth2/tokeninfo"))
            .and(matchers::query_param("access_token", TEST_TOKEN))
            .respond_with(ResponseTemplate::new(status_code.as_u16()).set_body_json(response_body))
            .expect(expected_calls)
            .mount(&self.token_info_mock)
            .await;
    }

    /// Fails the test if the token info endpoint is called at all
    pub async fn expect_no_token_info_lookup(&self) {
        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.token_info_mock)
            .await;
    }
}

/// Status and JSON body of a test request
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Panics if the status code doesn't match `expected`
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Panics if the body does not deserialize into `T`
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unknown_path_is_authenticated() {
        let fixture = TestFixture::new().await;
        fixture.expect_no_token_info_lookup().await;

        let response = fixture.get_anonymous("/does-not-exist").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_path_with_token_is_not_found() {
        let fixture = TestFixture::new().await;
        fixture
            .add_token_info_mock(json!({"scope": ["uid"]}), StatusCode::OK, 1)
            .await;

        let response = fixture.get("/does-not-exist").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_header_transport() {
        let fixture = TestFixture::with_config(|config| {
            config.authorizer.token_transport = "header".to_string();
        })
        .await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/oauth2/tokeninfo"))
            .and(matchers::header("authorization", "Bearer test-access-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uid": "jdoe"})))
            .expect(1)
            .mount(&fixture.token_info_mock)
            .await;

        let response = fixture.get("/me").await;

        response.assert_ok();
        assert_eq!(response.json["uid"], "jdoe");
    }
}
