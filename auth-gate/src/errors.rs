use crate::token_info::TokenInvalid;
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub detail: String,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with a detail message and status code
    pub fn new<S: ToString>(detail: S, status_code: StatusCode) -> Self {
        Self {
            detail: detail.to_string(),
            status_code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code;
        let body = json!({
            "detail": self.detail,
        });
        (status_code, Json(body)).into_response()
    }
}

/// Reasons an inbound request is turned away
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing or malformed bearer token")]
    MissingAccessToken,
    #[error(transparent)]
    TokenInvalid(#[from] TokenInvalid),
    #[error("Insufficient scope")]
    InsufficientScope,
    #[error("Scope precedence check failed")]
    PrecedenceFailed,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingAccessToken => StatusCode::UNAUTHORIZED,
            // Only authentication-class upstream answers are passed on
            AuthError::TokenInvalid(e) => match e.status {
                Some(status)
                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
                {
                    status
                }
                _ => StatusCode::UNAUTHORIZED,
            },
            AuthError::InsufficientScope | AuthError::PrecedenceFailed => StatusCode::FORBIDDEN,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = err.status();
        match err {
            // Upstream details stay in the logs
            AuthError::TokenInvalid(_) => ApiError::new("Invalid access token", status),
            other => ApiError::new(other.to_string(), status),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        ApiError::from(self).into_response()
    }
}
