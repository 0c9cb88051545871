//! Precedence hooks decide, ahead of scope enforcement, whether a request may
//! skip the scope check altogether.

use crate::context::AuthContext;
use async_trait::async_trait;
use http::request::Parts;
use log::debug;
use std::error::Error;

pub type HookError = Box<dyn Error + Send + Sync>;

/// Override evaluated before the scope check.
///
/// Returning `Ok(true)` lets the request through without looking at its scopes,
/// `Ok(false)` falls back to the regular scope check.
#[async_trait]
pub trait PrecedenceHook: Send + Sync {
    async fn bypass_scopes(&self, request: &Parts) -> Result<bool, HookError>;
}

/// Receives the error of a failed precedence hook.
///
/// Errors returned from here are logged and otherwise ignored.
#[async_trait]
pub trait PrecedenceErrorHandler: Send + Sync {
    async fn handle(&self, error: HookError) -> Result<(), HookError>;
}

/// Bypasses scope enforcement for tokens issued to a given realm
#[derive(Debug, Clone)]
pub struct RealmPrecedence {
    realm: String,
}

impl RealmPrecedence {
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }
}

#[async_trait]
impl PrecedenceHook for RealmPrecedence {
    async fn bypass_scopes(&self, request: &Parts) -> Result<bool, HookError> {
        let realm = AuthContext::token_info_of(request).and_then(|info| info.claim_str("realm"));
        let bypass = realm == Some(self.realm.as_str());
        if bypass {
            debug!("Token realm {} takes precedence over scopes", self.realm);
        }
        Ok(bypass)
    }
}
