//! Token info lookups against the authorization server.

use crate::config::ConfigError;
use http::StatusCode;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Metadata the authorization server returned for a bearer token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Granted scopes. Accepted as a JSON array or a space-delimited string.
    #[serde(default, deserialize_with = "deserialize_scope")]
    pub scope: BTreeSet<String>,
    /// Every other claim, as returned
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl TokenInfo {
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// String claim, e.g. `uid` or `realm`
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }
}

fn deserialize_scope<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scope {
        List(Vec<String>),
        Spaced(String),
    }

    Ok(match Option::<Scope>::deserialize(deserializer)? {
        Some(Scope::List(scopes)) => scopes.into_iter().collect(),
        Some(Scope::Spaced(scopes)) => scopes.split_whitespace().map(str::to_string).collect(),
        None => BTreeSet::new(),
    })
}

/// How the access token is handed to the token info endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenTransport {
    /// `?access_token=<token>`
    #[default]
    QueryParameter,
    /// `Authorization: Bearer <token>`
    AuthorizationHeader,
}

impl FromStr for TokenTransport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "query" => Ok(TokenTransport::QueryParameter),
            "header" => Ok(TokenTransport::AuthorizationHeader),
            other => Err(ConfigError::InvalidTokenTransport(other.to_string())),
        }
    }
}

/// The token info endpoint did not vouch for the token
#[derive(Debug, Error)]
#[error("Token invalid: {reason}")]
pub struct TokenInvalid {
    /// Upstream status, absent when the endpoint could not be reached
    pub status: Option<StatusCode>,
    pub reason: String,
}

/// Client for the token info endpoint
#[derive(Clone, Debug)]
pub struct TokenInfoClient {
    client: Client,
    endpoint: Url,
    transport: TokenTransport,
}

impl TokenInfoClient {
    pub fn new(client: Client, endpoint: Url, transport: TokenTransport) -> Self {
        Self {
            client,
            endpoint,
            transport,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Look up the token info of `access_token`
    pub async fn introspect(&self, access_token: &str) -> Result<TokenInfo, TokenInvalid> {
        let request = match self.transport {
            TokenTransport::QueryParameter => {
                let mut url = self.endpoint.clone();
                url.query_pairs_mut().append_pair("access_token", access_token);
                self.client.get(url)
            }
            TokenTransport::AuthorizationHeader => {
                self.client.get(self.endpoint.clone()).bearer_auth(access_token)
            }
        };

        debug!("Querying token info at: {}", self.endpoint);
        let response = request.send().await.map_err(|e| {
            warn!("Failed to reach token info endpoint: {}", e);
            TokenInvalid {
                status: None,
                reason: format!("token info request failed: {e}"),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!("Token info endpoint answered with status: {}", status);
            return Err(TokenInvalid {
                status: Some(status),
                reason: format!("token info request failed with status: {status}"),
            });
        }

        let body = response.bytes().await.map_err(|e| TokenInvalid {
            status: Some(status),
            reason: format!("failed to read token info response: {e}"),
        })?;
        serde_json::from_slice(&body).map_err(|e| TokenInvalid {
            status: Some(status),
            reason: format!("failed to parse token info response: {e}"),
        })
    }
}
