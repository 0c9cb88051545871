use crate::state::AppState;
use crate::token_info::TokenInfo;
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

/// Resources visible to the caller
#[derive(Debug, Serialize, Deserialize)]
pub struct ResourceList {
    pub owner: Option<String>,
    pub required_scopes: Vec<String>,
    pub resources: Vec<String>,
}

/// Routes available to any authenticated caller
pub(super) fn router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

/// Routes guarded by the scope gate
pub(super) fn protected_router() -> Router<AppState> {
    Router::new().route("/resources", get(list_resources))
}

/// Token info of the caller
async fn me(token_info: TokenInfo) -> Json<TokenInfo> {
    Json(token_info)
}

async fn list_resources(
    State(state): State<AppState>,
    token_info: TokenInfo,
) -> Json<ResourceList> {
    let owner = token_info.claim_str("uid").map(str::to_string);
    let resources = owner
        .iter()
        .map(|uid| format!("/resources/{uid}"))
        .collect();

    Json(ResourceList {
        owner,
        required_scopes: state.config.required_scopes.clone(),
        resources,
    })
}
