//! Session gating and current-user loading middleware.
//!
//! Both are plain `from_fn_with_state` functions:
//!
//! ```ignore
//! router
//!     .layer(middleware::from_fn_with_state(guard, user_auth_required))
//!     .layer(middleware::from_fn_with_state(state, user_fetched))
//! ```

use crate::extractors::Session;
use crate::provider::{Criteria, PASSWORD};
use crate::response::{error_body, ErrorObject};
use crate::session::SessionStore;
use crate::state::AppState;
use crate::store::Record;
use axum::{
    extract::{FromRef, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

/// Renders a login page for an anonymous request; receives the forward URL.
pub type LoginView = Arc<dyn Fn(&str) -> Response + Send + Sync>;

#[derive(Clone)]
pub struct AuthGuard {
    pub sessions: Arc<SessionStore>,
    pub login_url: Option<String>,
    pub login_view: Option<LoginView>,
}

impl AuthGuard {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self {
            sessions,
            login_url: None,
            login_view: None,
        }
    }

    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = Some(url.into());
        self
    }

    pub fn with_login_view(mut self, view: impl Fn(&str) -> Response + Send + Sync + 'static) -> Self {
        self.login_view = Some(Arc::new(view));
        self
    }

    fn reject(&self, forward_url: &str) -> Response {
        if let Some(url) = &self.login_url {
            return Redirect::to(url).into_response();
        }
        if let Some(view) = &self.login_view {
            return view(forward_url);
        }
        error_body(
            StatusCode::UNAUTHORIZED,
            vec![ErrorObject::new("The user is not logged in")],
        )
        .into_response()
    }
}

impl FromRef<AuthGuard> for Arc<SessionStore> {
    fn from_ref(guard: &AuthGuard) -> Self {
        guard.sessions.clone()
    }
}

/// Continue only when the session carries a user id.
pub async fn user_auth_required(
    State(guard): State<AuthGuard>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    if session.is_logged_in() {
        return next.run(request).await;
    }
    let forward_url = request.uri().to_string();
    tracing::debug!(forward_url = %forward_url, "rejected anonymous request");
    guard.reject(&forward_url)
}

/// The session's user without its password; empty when anonymous.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurrentUser(pub Record);

impl CurrentUser {
    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }
}

/// Load the session's user into a [`CurrentUser`] request extension.
pub async fn user_fetched(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let mut me = Record::new();
    if let Some(user_id) = session.user_id() {
        match state.users.find_one(Criteria::new().with_object_id(user_id)).await {
            Ok(user) => {
                me = user;
                me.remove(PASSWORD);
            }
            Err(e) => tracing::debug!(user_id = %user_id, error = %e, "session user not loaded"),
        }
    }
    request.extensions_mut().insert(CurrentUser(me));
    next.run(request).await
}
