//! Bearer token validation for inbound requests.

use crate::config::{AuthorizerConfig, ConfigError};
use crate::context::AuthContext;
use crate::errors::AuthError;
use crate::token_info::{TokenInfoClient, TokenTransport};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::header::AUTHORIZATION;
use http::HeaderMap;
use log::{debug, warn};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Validates the bearer token of every request that is not on a public path
#[derive(Debug)]
pub struct RequestAuthorizer {
    config: AuthorizerConfig,
    token_info: TokenInfoClient,
}

impl RequestAuthorizer {
    fn create_token_info_client(timeout: u64) -> Result<Client, ConfigError> {
        Ok(Client::builder()
            .timeout(Duration::from_secs(timeout))
            .connect_timeout(Duration::from_secs(2))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()?)
    }

    /// Builds the authorizer, failing right away when the token info endpoint
    /// is missing or unusable
    pub fn new(config: AuthorizerConfig) -> Result<Self, ConfigError> {
        let client = Self::create_token_info_client(config.query_timeout)?;
        Self::with_client(config, client)
    }

    /// Like [`RequestAuthorizer::new`], reusing an existing HTTP client
    pub fn with_client(config: AuthorizerConfig, client: Client) -> Result<Self, ConfigError> {
        let endpoint = match config.token_info_endpoint.as_deref() {
            Some(endpoint) if !endpoint.trim().is_empty() => Url::parse(endpoint)?,
            _ => return Err(ConfigError::MissingTokenInfoEndpoint),
        };
        let transport: TokenTransport = config.token_transport.parse()?;

        Ok(Self {
            token_info: TokenInfoClient::new(client, endpoint, transport),
            config,
        })
    }

    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    /// Parsed token info endpoint
    pub fn token_info_endpoint(&self) -> &Url {
        self.token_info.endpoint()
    }

    /// Validates `request` and attaches its [`AuthContext`].
    ///
    /// Requests on public paths get an empty context without any lookup.
    pub async fn authorize(&self, mut request: Request) -> Result<Request, AuthError> {
        let path = request.uri().path();
        if self.config.is_public(path) {
            debug!("Public endpoint {}, skipping token validation", path);
            request.extensions_mut().insert(AuthContext::default());
            return Ok(request);
        }

        let token = match bearer_token(request.headers()) {
            Some(token) => token,
            None => {
                warn!(
                    "Missing or malformed bearer token on request to {}",
                    request.uri().path()
                );
                return Err(AuthError::MissingAccessToken);
            }
        };

        let token_info = self.token_info.introspect(token).await.map_err(|e| {
            warn!("Token validation failed for {}: {}", request.uri().path(), e);
            AuthError::TokenInvalid(e)
        })?;

        request
            .extensions_mut()
            .insert(AuthContext::authenticated(token_info));
        Ok(request)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively; an empty token counts as missing.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Authentication middleware, for use with `axum::middleware::from_fn_with_state`
pub async fn authenticate(
    State(authorizer): State<Arc<RequestAuthorizer>>,
    request: Request,
    next: Next,
) -> Response {
    match authorizer.authorize(request).await {
        Ok(request) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}
