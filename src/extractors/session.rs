//! Extract the caller's session from the session cookie.

use crate::session::{cookie_value, SessionData, SessionStore};
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderValue},
};
use std::sync::Arc;

/// The session attached to a request, if any. Handlers change it through
/// [`Session::login`] and [`Session::logout`], which return the `Set-Cookie`
/// value to send back.
#[derive(Clone)]
pub struct Session {
    store: Arc<SessionStore>,
    id: Option<String>,
    data: SessionData,
}

impl Session {
    /// A session with no cookie behind it.
    pub fn anonymous(store: Arc<SessionStore>) -> Self {
        Session {
            store,
            id: None,
            data: SessionData::default(),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.data.user_id.as_deref().filter(|s| !s.is_empty())
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id().is_some()
    }

    /// Replace any existing session with a fresh one bound to `user_id`.
    pub fn login(&mut self, user_id: impl Into<String>) -> Option<HeaderValue> {
        if let Some(old) = self.id.take() {
            self.store.destroy(&old);
        }
        self.data = SessionData {
            user_id: Some(user_id.into()),
        };
        let id = self.store.create(self.data.clone());
        let cookie = self.store.set_cookie(&id);
        self.id = Some(id);
        cookie
    }

    /// Destroy the session. Returns the former user id and an expiring cookie.
    pub fn logout(&mut self) -> (Option<String>, Option<HeaderValue>) {
        if let Some(id) = self.id.take() {
            self.store.destroy(&id);
        }
        let user_id = std::mem::take(&mut self.data).user_id;
        (user_id, self.store.expired_cookie())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    Arc<SessionStore>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = Arc::<SessionStore>::from_ref(state);
        let found = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| cookie_value(v, store.cookie_name()))
            .find_map(|id| store.get(id).map(|data| (id.to_string(), data)));
        let (id, data) = match found {
            Some((id, data)) => (Some(id), data),
            None => (None, SessionData::default()),
        };
        Ok(Session { store, id, data })
    }
}
