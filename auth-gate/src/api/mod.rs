mod health;
mod resources;

use crate::authorizer::authenticate;
use crate::scope_gate::require_scopes;
use crate::state::AppState;
use axum::{middleware, Router};

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(resources::router())
        .merge(protected_routes(state))
        // layer instead of route_layer, so unmatched paths are authenticated as well
        .layer(middleware::from_fn_with_state(
            state.authorizer.clone(),
            authenticate,
        ))
}

/// Routes that require the configured scopes on top of a valid token
fn protected_routes(state: &AppState) -> Router<AppState> {
    resources::protected_router().route_layer(middleware::from_fn_with_state(
        state.scope_gate.clone(),
        require_scopes,
    ))
}
