//! # token-engine
//!
//! Acquires OAuth2 access tokens on behalf of a client application.
//!
//! ## Components
//!
//! - **Credentials:** Loads and caches client/user credentials per directory.
//! - **Grant:** Grant kinds and the form bodies sent for each of them.
//! - **Engine:** Sends grant requests to the token endpoint and classifies failures.
//!
//! ```no_run
//! use token_engine::{AcquisitionConfig, TokenEngine, PASSWORD_CREDENTIALS_GRANT};
//!
//! # async fn run() -> Result<(), token_engine::TokenError> {
//! let engine = TokenEngine::builder().build()?;
//! let config = AcquisitionConfig::new(
//!     PASSWORD_CREDENTIALS_GRANT,
//!     "https://auth.example.org/oauth2/access_token",
//!     "/etc/credentials",
//! )
//! .with_scopes(["uid", "nakadi.event_stream.read"])
//! .with_query_param("realm", "/services");
//!
//! let token = engine.acquire_token(&config).await?;
//! println!("{}", token.access_token);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod credentials;
pub mod error;
pub mod grant;

pub use crate::builder::TokenEngineBuilder;
pub use crate::credentials::{
    CredentialStore, Credentials, CredentialsLoader, FileCredentialsLoader,
};
pub use crate::error::{CredentialsError, TokenError};
pub use crate::grant::{
    AcquisitionConfig, Grant, GrantKind, GrantRequest, AUTHORIZATION_CODE_GRANT,
    PASSWORD_CREDENTIALS_GRANT, REFRESH_TOKEN_GRANT,
};

use log::{debug, warn};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Successful token endpoint response.
///
/// Only `access_token` is interpreted; every other field is kept as returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sends grant requests to OAuth2 token endpoints
#[derive(Clone)]
pub struct TokenEngine {
    client: Client,
    credentials: CredentialStore,
}

impl std::fmt::Debug for TokenEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEngine").finish_non_exhaustive()
    }
}

impl TokenEngine {
    pub fn new(client: Client, credentials: CredentialStore) -> Self {
        Self {
            client,
            credentials,
        }
    }

    pub fn builder() -> TokenEngineBuilder {
        TokenEngineBuilder::new()
    }

    /// Request an access token using the grant described by `config`.
    ///
    /// The grant type and its fields are validated before credentials are loaded
    /// or any request is sent. Failed requests are not retried.
    pub async fn acquire_token(
        &self,
        config: &AcquisitionConfig,
    ) -> Result<TokenResponse, TokenError> {
        let request = GrantRequest::try_from(config)?;
        let credentials = self.credentials.load(&request.credentials_dir).await?;
        let body = request.form_body(&credentials)?;

        debug!(
            "Requesting access token from {} with grant_type '{}'",
            request.endpoint,
            request.grant.kind()
        );

        let response = self
            .client
            .post(request.endpoint.clone())
            .header(AUTHORIZATION, credentials.basic_auth_header())
            .form(&body)
            .send()
            .await
            .map_err(TokenError::TokenRequestFailed)?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            warn!(
                "Token endpoint {} rejected request with status {}",
                request.endpoint, status
            );
            return Err(TokenError::TokenRequestRejected { status, reason });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(TokenError::TokenRequestFailed)?;
        let token: TokenResponse =
            serde_json::from_slice(&bytes).map_err(|e| TokenError::TokenRequestRejected {
                status,
                reason: format!("unusable token response: {e}"),
            })?;

        if token.access_token.is_empty() {
            return Err(TokenError::TokenRequestRejected {
                status,
                reason: "empty access_token in token response".to_string(),
            });
        }

        debug!("Received access token from {}", request.endpoint);
        Ok(token)
    }
}
