//! Bearer token validation configuration

use confique::Config;

/// Options recognised by the request authorizer
#[derive(Debug, Config, Clone)]
pub struct AuthorizerConfig {
    /// Token info (introspection) endpoint. Required: the authorizer refuses
    /// to start without it.
    #[config(env = "GATE_TOKEN_INFO_ENDPOINT")]
    pub token_info_endpoint: Option<String>,

    /// Path prefixes that skip token validation, comma-separated in the
    /// environment (default: "/health")
    #[config(
        env = "GATE_PUBLIC_ENDPOINTS",
        parse_env = confique::env::parse::list_by_comma,
        default = ["/health"]
    )]
    pub public_endpoints: Vec<String>,

    /// How the access token is passed to the token info endpoint:
    /// "query" (`?access_token=`) or "header" (`Authorization: Bearer`)
    /// (default: "query")
    #[config(env = "GATE_TOKEN_TRANSPORT", default = "query")]
    pub token_transport: String,

    /// Timeout for token info queries in seconds (default: 5)
    #[config(env = "GATE_TOKEN_INFO_TIMEOUT", default = 5)]
    pub query_timeout: u64,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            token_info_endpoint: None,
            public_endpoints: vec!["/health".to_string()],
            token_transport: "query".to_string(),
            query_timeout: 5,
        }
    }
}

impl AuthorizerConfig {
    /// Whether `path` falls under one of the public endpoint prefixes
    pub fn is_public(&self, path: &str) -> bool {
        self.public_endpoints
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}
