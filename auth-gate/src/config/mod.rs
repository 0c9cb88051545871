pub use crate::config::authorizer::AuthorizerConfig;
use confique::Config;
use thiserror::Error;

pub mod authorizer;

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_FILE_ENV: &str = "GATE_CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "auth-gate.toml";

/// Main configuration structure for the auth-gate server
#[derive(Debug, Config, Clone)]
pub struct GateConfig {
    /// The port the server will listen to (default: 8080)
    #[config(env = "GATE_PORT", default = 8080)]
    pub port: u16,

    /// Scopes required by the protected resource routes (default: "uid")
    #[config(
        env = "GATE_REQUIRED_SCOPES",
        parse_env = confique::env::parse::list_by_comma,
        default = ["uid"]
    )]
    pub required_scopes: Vec<String>,

    /// Tokens from this realm skip scope enforcement (default: unset)
    #[config(env = "GATE_PRECEDENCE_REALM")]
    pub precedence_realm: Option<String>,

    /// Upper bound for a precedence check in milliseconds (default: 1000)
    #[config(env = "GATE_PRECEDENCE_TIMEOUT_MS", default = 1000)]
    pub precedence_timeout_ms: u64,

    /// Bearer token validation
    #[config(nested)]
    pub authorizer: AuthorizerConfig,
}

impl GateConfig {
    /// Loads the configuration from environment variables, then from the
    /// TOML file named by `GATE_CONFIG_FILE` (if it exists)
    pub fn new() -> Result<Self, confique::Error> {
        let path =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        GateConfig::builder().env().file(path).load()
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(token_info_mock: &wiremock::MockServer) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            required_scopes: vec!["uid".to_string()],
            precedence_realm: None,
            precedence_timeout_ms: 1000,
            authorizer: AuthorizerConfig {
                token_info_endpoint: Some(format!("{}/oauth2/tokeninfo", token_info_mock.uri())),
                ..Default::default()
            },
        }
    }
}

/// Errors raised while turning configuration into runtime components
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("token_info_endpoint is required")]
    MissingTokenInfoEndpoint,
    #[error("Invalid token_info_endpoint: {0}")]
    InvalidTokenInfoEndpoint(#[from] url::ParseError),
    #[error("Invalid token_transport '{0}', expected 'query' or 'header'")]
    InvalidTokenTransport(String),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
