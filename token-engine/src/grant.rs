//! Grant kinds and the token requests built from them.

use crate::credentials::Credentials;
use crate::error::TokenError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

pub const PASSWORD_CREDENTIALS_GRANT: &str = "password";
pub const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";
pub const REFRESH_TOKEN_GRANT: &str = "refresh_token";

/// Grant kinds the engine knows how to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantKind {
    PasswordCredentials,
    AuthorizationCode,
    RefreshToken,
}

impl GrantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantKind::PasswordCredentials => PASSWORD_CREDENTIALS_GRANT,
            GrantKind::AuthorizationCode => AUTHORIZATION_CODE_GRANT,
            GrantKind::RefreshToken => REFRESH_TOKEN_GRANT,
        }
    }
}

impl FromStr for GrantKind {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            PASSWORD_CREDENTIALS_GRANT => Ok(GrantKind::PasswordCredentials),
            AUTHORIZATION_CODE_GRANT => Ok(GrantKind::AuthorizationCode),
            REFRESH_TOKEN_GRANT => Ok(GrantKind::RefreshToken),
            other => Err(TokenError::UnsupportedGrantType(other.to_string())),
        }
    }
}

impl fmt::Display for GrantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a single token acquisition.
///
/// Fields that do not apply to the selected `grant_type` are ignored and never
/// reach the token endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AcquisitionConfig {
    /// One of `password`, `authorization_code` or `refresh_token`
    pub grant_type: String,
    /// Token endpoint URL
    pub access_token_endpoint: String,
    /// Directory holding `client.json` (and `user.json` for the password grant)
    pub credentials_dir: PathBuf,
    /// Requested scopes, sent space-separated
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    /// Extra query parameters appended to the token endpoint URL (e.g. `realm`)
    #[serde(default)]
    pub query_params: Option<BTreeMap<String, String>>,
    /// Authorization code (authorization_code grant)
    #[serde(default)]
    pub code: Option<String>,
    /// Redirect URI used to obtain the code (authorization_code grant)
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// Refresh token (refresh_token grant)
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl AcquisitionConfig {
    pub fn new(
        grant_type: impl Into<String>,
        access_token_endpoint: impl Into<String>,
        credentials_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            grant_type: grant_type.into(),
            access_token_endpoint: access_token_endpoint.into(),
            credentials_dir: credentials_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_scopes<S: Into<String>>(mut self, scopes: impl IntoIterator<Item = S>) -> Self {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

/// Fields that only exist for one grant kind
#[derive(Debug, Clone, PartialEq)]
pub enum Grant {
    PasswordCredentials {
        scopes: Vec<String>,
    },
    AuthorizationCode {
        code: String,
        redirect_uri: String,
        scopes: Option<Vec<String>>,
    },
    RefreshToken {
        refresh_token: String,
    },
}

impl Grant {
    pub fn kind(&self) -> GrantKind {
        match self {
            Grant::PasswordCredentials { .. } => GrantKind::PasswordCredentials,
            Grant::AuthorizationCode { .. } => GrantKind::AuthorizationCode,
            Grant::RefreshToken { .. } => GrantKind::RefreshToken,
        }
    }
}

/// A validated token request, ready to be sent once credentials are loaded
#[derive(Debug, Clone, PartialEq)]
pub struct GrantRequest {
    pub grant: Grant,
    /// Token endpoint including any extra query parameters
    pub endpoint: Url,
    pub credentials_dir: PathBuf,
}

impl TryFrom<&AcquisitionConfig> for GrantRequest {
    type Error = TokenError;

    fn try_from(config: &AcquisitionConfig) -> Result<Self, Self::Error> {
        let kind: GrantKind = config.grant_type.parse()?;

        let grant = match kind {
            GrantKind::PasswordCredentials => Grant::PasswordCredentials {
                scopes: config.scopes.clone().unwrap_or_default(),
            },
            GrantKind::AuthorizationCode => Grant::AuthorizationCode {
                code: required(&config.code, "code", kind)?,
                redirect_uri: required(&config.redirect_uri, "redirect_uri", kind)?,
                scopes: config.scopes.clone().filter(|s| !s.is_empty()),
            },
            GrantKind::RefreshToken => Grant::RefreshToken {
                refresh_token: required(&config.refresh_token, "refresh_token", kind)?,
            },
        };

        let mut endpoint = Url::parse(&config.access_token_endpoint)?;
        if let Some(params) = &config.query_params {
            let mut pairs = endpoint.query_pairs_mut();
            for (name, value) in params {
                pairs.append_pair(name, value);
            }
        }

        Ok(GrantRequest {
            grant,
            endpoint,
            credentials_dir: config.credentials_dir.clone(),
        })
    }
}

fn required(value: &Option<String>, name: &str, kind: GrantKind) -> Result<String, TokenError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(TokenError::InvalidGrantRequest(format!(
            "{name} is required for the {kind} grant"
        ))),
    }
}

impl GrantRequest {
    /// Form-encoded body parameters for the token endpoint
    pub fn form_body(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<(&'static str, String)>, TokenError> {
        let mut body = vec![("grant_type", self.grant.kind().as_str().to_string())];

        match &self.grant {
            Grant::PasswordCredentials { scopes } => {
                let (Some(user), Some(password)) = (&credentials.user, &credentials.password)
                else {
                    return Err(TokenError::CredentialsUnavailable {
                        dir: self.credentials_dir.clone(),
                        reason: "user credentials are required for the password grant"
                            .to_string(),
                    });
                };
                body.push(("username", user.clone()));
                body.push(("password", password.clone()));
                // Sent even when empty
                body.push(("scope", scopes.join(" ")));
            }
            Grant::AuthorizationCode {
                code,
                redirect_uri,
                scopes,
            } => {
                body.push(("code", code.clone()));
                body.push(("redirect_uri", redirect_uri.clone()));
                if let Some(scopes) = scopes {
                    body.push(("scope", scopes.join(" ")));
                }
            }
            Grant::RefreshToken { refresh_token } => {
                body.push(("refresh_token", refresh_token.clone()));
            }
        }

        Ok(body)
    }
}
