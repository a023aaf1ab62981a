//! Shared application state for all routes.

use crate::config::AuthConfig;
use crate::provider::{ObjectsDataProvider, SchemasDataProvider, UsersDataProvider};
use crate::session::SessionStore;
use axum::extract::FromRef;
use std::sync::Arc;

/// Sign-up and login behaviour.
#[derive(Clone, Debug, PartialEq)]
pub struct SignUpConfig {
    pub login_field: String,
    pub login_if_success: bool,
}

impl Default for SignUpConfig {
    fn default() -> Self {
        Self {
            login_field: "email".into(),
            login_if_success: true,
        }
    }
}

impl From<&AuthConfig> for SignUpConfig {
    fn from(auth: &AuthConfig) -> Self {
        Self {
            login_field: auth.login_field.clone(),
            login_if_success: auth.login_if_success,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub objects: Arc<ObjectsDataProvider>,
    pub schemas: Arc<SchemasDataProvider>,
    pub users: Arc<UsersDataProvider>,
    pub sessions: Arc<SessionStore>,
    pub sign_up: SignUpConfig,
}

impl FromRef<AppState> for Arc<SessionStore> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
