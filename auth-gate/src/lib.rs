//! # auth-gate
//!
//! OAuth2 bearer token protection for axum services.
//!
//! ## Components
//!
//! - **Authorizer:** Validates bearer tokens against a token info endpoint and
//!   attaches the returned [`TokenInfo`] to the request.
//! - **Scope gate:** Requires scopes per route, optionally overridden by a
//!   [`PrecedenceHook`].
//! - **Token engine:** Re-exported [`token_engine`] for acquiring tokens for
//!   outbound calls.
//!
//! ```no_run
//! use std::sync::Arc;
//! use auth_gate::{
//!     authenticate, require_scopes, AuthorizerConfig, RequestAuthorizer, ScopeGate, TokenInfo,
//! };
//! use axum::{middleware, routing::get, Json, Router};
//!
//! # fn app() -> Result<Router, auth_gate::ConfigError> {
//! let authorizer = Arc::new(RequestAuthorizer::new(AuthorizerConfig {
//!     token_info_endpoint: Some("https://auth.example.org/oauth2/tokeninfo".to_string()),
//!     ..Default::default()
//! })?);
//! let gate = Arc::new(ScopeGate::new(["uid"]));
//!
//! Ok(Router::new()
//!     .route("/me", get(|info: TokenInfo| async move { Json(info) }))
//!     .route_layer(middleware::from_fn_with_state(gate, require_scopes))
//!     .layer(middleware::from_fn_with_state(authorizer, authenticate)))
//! # }
//! ```

mod api;
pub mod authorizer;
pub mod config;
pub mod context;
pub mod errors;
pub mod precedence;
pub mod scope_gate;
pub mod scopes;
pub mod state;
#[cfg(test)]
mod test_utils;
pub mod token_info;

pub use token_engine;

pub use crate::authorizer::{authenticate, bearer_token, RequestAuthorizer};
pub use crate::config::{AuthorizerConfig, ConfigError, GateConfig};
pub use crate::context::AuthContext;
pub use crate::errors::{ApiError, AuthError};
pub use crate::precedence::{HookError, PrecedenceErrorHandler, PrecedenceHook, RealmPrecedence};
pub use crate::scope_gate::{require_scopes, PrecedenceOptions, ScopeGate};
pub use crate::token_info::{TokenInfo, TokenInfoClient, TokenInvalid, TokenTransport};

use crate::state::AppState;
use axum::Router;

/// Create the resource server application for a given state
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(api::router(&state))
        .with_state(state)
}
