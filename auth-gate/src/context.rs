use crate::errors::AuthError;
use crate::token_info::TokenInfo;
use axum::extract::FromRequestParts;
use http::request::Parts;

/// Per-request authentication state, stored in the request extensions.
///
/// The request authorizer inserts it once the bearer token was validated;
/// `token_info` stays `None` for requests that bypassed validation.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub token_info: Option<TokenInfo>,
}

impl AuthContext {
    pub fn authenticated(token_info: TokenInfo) -> Self {
        Self {
            token_info: Some(token_info),
        }
    }

    /// The context attached to `parts`, if any
    pub fn of(parts: &Parts) -> Option<&AuthContext> {
        parts.extensions.get::<AuthContext>()
    }

    /// Token info attached to `parts`, if the request was authenticated
    pub fn token_info_of(parts: &Parts) -> Option<&TokenInfo> {
        Self::of(parts).and_then(|context| context.token_info.as_ref())
    }
}

/// Handlers behind the authorizer can take `TokenInfo` as an argument
impl<S> FromRequestParts<S> for TokenInfo
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        AuthContext::token_info_of(parts)
            .cloned()
            .ok_or(AuthError::MissingAccessToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    #[test]
    fn test_token_info_of_unauthenticated_request() {
        let (parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        assert!(AuthContext::of(&parts).is_none());
        assert!(AuthContext::token_info_of(&parts).is_none());
    }

    #[test]
    fn test_token_info_of_authenticated_request() {
        let mut request = Request::builder().uri("/").body(()).unwrap();
        let info = TokenInfo {
            scope: ["uid".to_string()].into_iter().collect(),
            ..Default::default()
        };
        request
            .extensions_mut()
            .insert(AuthContext::authenticated(info.clone()));
        let (parts, _) = request.into_parts();
        assert_eq!(AuthContext::token_info_of(&parts), Some(&info));
    }

    #[tokio::test]
    async fn test_extractor_rejects_without_context() {
        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        let result = TokenInfo::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::MissingAccessToken)));
    }
}
