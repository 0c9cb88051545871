use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::credentials::{CredentialStore, CredentialsLoader, FileCredentialsLoader};
use crate::error::TokenError;
use crate::TokenEngine;

/// A builder for configuring a [`TokenEngine`].
pub struct TokenEngineBuilder {
    pub(crate) client: Option<Client>,
    pub(crate) loader: Arc<dyn CredentialsLoader>,
    pub(crate) timeout: Duration,
    pub(crate) connect_timeout: Duration,
}

impl TokenEngineBuilder {
    /// Creates a new builder reading credentials from disk, with a 10s request timeout.
    pub fn new() -> Self {
        Self {
            client: None,
            loader: Arc::new(FileCredentialsLoader),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(2),
        }
    }

    /// Uses an existing HTTP client. Timeouts set on the builder are ignored.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Replaces the credentials source.
    pub fn with_loader(mut self, loader: Arc<dyn CredentialsLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Sets the total timeout of a token request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection timeout of a token request.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<TokenEngine, TokenError> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout)
                .connect_timeout(self.connect_timeout)
                .pool_idle_timeout(Some(Duration::from_secs(90)))
                .build()
                .map_err(TokenError::Client)?,
        };
        Ok(TokenEngine::new(client, CredentialStore::new(self.loader)))
    }
}

impl Default for TokenEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
