use crate::authorizer::RequestAuthorizer;
use crate::config::{ConfigError, GateConfig};
use crate::precedence::RealmPrecedence;
use crate::scope_gate::{PrecedenceOptions, ScopeGate};
use log::info;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GateConfig>,
    pub authorizer: Arc<RequestAuthorizer>,
    pub scope_gate: Arc<ScopeGate>,
}

impl AppState {
    fn create_scope_gate(config: &GateConfig) -> ScopeGate {
        let gate = ScopeGate::new(config.required_scopes.iter().cloned());
        match &config.precedence_realm {
            Some(realm) => {
                let hook = RealmPrecedence::new(realm.clone());
                info!("Tokens of realm {} skip scope enforcement", hook.realm());
                let mut options = PrecedenceOptions::new(hook);
                if config.precedence_timeout_ms > 0 {
                    options = options
                        .with_timeout(Duration::from_millis(config.precedence_timeout_ms));
                }
                gate.with_precedence(options)
            }
            None => gate,
        }
    }

    pub fn new(config: GateConfig) -> Result<Self, ConfigError> {
        let authorizer = RequestAuthorizer::new(config.authorizer.clone())?;
        Ok(Self {
            scope_gate: Arc::new(Self::create_scope_gate(&config)),
            authorizer: Arc::new(authorizer),
            config: Arc::new(config),
        })
    }
}
