use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Credentials unavailable in {dir}: {reason}")]
    CredentialsUnavailable { dir: PathBuf, reason: String },

    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    #[error("Invalid grant request: {0}")]
    InvalidGrantRequest(String),

    #[error("Invalid token endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("Token request rejected (status {status}): {reason}")]
    TokenRequestRejected { status: StatusCode, reason: String },

    #[error("Token request failed: {0}")]
    TokenRequestFailed(#[source] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TokenError {
    /// Upstream status code, when the token endpoint answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TokenError::TokenRequestRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while reading a credentials directory
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed credentials file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
