//! Per-route scope enforcement with an optional precedence override.

use crate::context::AuthContext;
use crate::errors::AuthError;
use crate::precedence::{HookError, PrecedenceErrorHandler, PrecedenceHook};
use crate::scopes;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::request::Parts;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Precedence hook wiring for a [`ScopeGate`]
#[derive(Clone)]
pub struct PrecedenceOptions {
    pub hook: Arc<dyn PrecedenceHook>,
    pub error_handler: Option<Arc<dyn PrecedenceErrorHandler>>,
    /// Upper bound for a single hook call; exceeding it counts as a hook failure
    pub timeout: Option<Duration>,
}

impl PrecedenceOptions {
    pub fn new(hook: impl PrecedenceHook + 'static) -> Self {
        Self {
            hook: Arc::new(hook),
            error_handler: None,
            timeout: None,
        }
    }

    pub fn with_error_handler(mut self, handler: impl PrecedenceErrorHandler + 'static) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn evaluate(&self, request: &Parts) -> Result<bool, HookError> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.hook.bypass_scopes(request))
                .await
                .unwrap_or_else(|elapsed| Err(elapsed.into())),
            None => self.hook.bypass_scopes(request).await,
        }
    }

    /// Hands `error` to the error handler in a detached task. The request does
    /// not wait for it; its errors and panics are only logged.
    fn report(&self, error: HookError) {
        let Some(handler) = self.error_handler.clone() else {
            return;
        };

        let task = tokio::spawn(async move { handler.handle(error).await });
        tokio::spawn(async move {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Precedence error handler failed: {}", e),
                Err(e) => warn!("Precedence error handler panicked: {}", e),
            }
        });
    }
}

/// Requires a set of scopes on the routes it guards
#[derive(Clone)]
pub struct ScopeGate {
    required: Vec<String>,
    precedence: Option<PrecedenceOptions>,
}

impl ScopeGate {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            precedence: None,
        }
    }

    pub fn with_precedence(mut self, options: PrecedenceOptions) -> Self {
        self.precedence = Some(options);
        self
    }

    pub fn required_scopes(&self) -> &[String] {
        &self.required
    }

    /// Decide whether the request described by `parts` may proceed.
    ///
    /// A configured precedence hook is asked first; if it fails the request is
    /// denied with [`AuthError::PrecedenceFailed`].
    pub async fn check(&self, parts: &Parts) -> Result<(), AuthError> {
        if let Some(precedence) = &self.precedence {
            match precedence.evaluate(parts).await {
                Ok(true) => {
                    debug!("Precedence hook bypassed scope check for {}", parts.uri.path());
                    return Ok(());
                }
                Ok(false) => {}
                Err(error) => {
                    warn!("Precedence hook failed for {}: {}", parts.uri.path(), error);
                    precedence.report(error);
                    return Err(AuthError::PrecedenceFailed);
                }
            }
        }

        let empty = BTreeSet::new();
        let granted = AuthContext::token_info_of(parts)
            .map(|info| &info.scope)
            .unwrap_or(&empty);

        if scopes::authorize(&self.required, granted) {
            Ok(())
        } else {
            warn!(
                "Insufficient scope for {}: required {:?}, granted {:?}",
                parts.uri.path(),
                self.required,
                granted
            );
            Err(AuthError::InsufficientScope)
        }
    }
}

/// Scope enforcement middleware, for use with `axum::middleware::from_fn_with_state`
pub async fn require_scopes(
    State(gate): State<Arc<ScopeGate>>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    match gate.check(&parts).await {
        Ok(()) => next.run(Request::from_parts(parts, body)).await,
        Err(e) => e.into_response(),
    }
}
