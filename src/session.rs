//! Process-local session store keyed by a random cookie value.

use axum::http::HeaderValue;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionData {
    pub user_id: Option<String>,
}

struct Entry {
    data: SessionData,
    last_seen: Instant,
}

/// Sessions idle for longer than the TTL read as absent and are dropped.
pub struct SessionStore {
    cookie_name: String,
    ttl: Duration,
    sessions: RwLock<HashMap<String, Entry>>,
}

impl SessionStore {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            ttl: DEFAULT_SESSION_TTL,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn expired(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.last_seen) >= self.ttl
    }

    /// Live session data; refreshes the idle timer.
    pub fn get(&self, session_id: &str) -> Option<SessionData> {
        let mut sessions = self.sessions.write().ok()?;
        let now = Instant::now();
        let expired = self.expired(sessions.get(session_id)?, now);
        if expired {
            tracing::debug!("session expired");
            sessions.remove(session_id);
            return None;
        }
        let entry = sessions.get_mut(session_id)?;
        entry.last_seen = now;
        Some(entry.data.clone())
    }

    /// Store `data` under a fresh id and return the id. Expired sessions are
    /// purged first.
    pub fn create(&self, data: SessionData) -> String {
        let session_id = uuid::Uuid::new_v4().simple().to_string();
        if let Ok(mut sessions) = self.sessions.write() {
            let now = Instant::now();
            let before = sessions.len();
            sessions.retain(|_, entry| !self.expired(entry, now));
            if sessions.len() < before {
                tracing::debug!(purged = before - sessions.len(), "purged expired sessions");
            }
            sessions.insert(session_id.clone(), Entry { data, last_seen: now });
        }
        session_id
    }

    pub fn destroy(&self, session_id: &str) -> Option<SessionData> {
        self.sessions.write().ok()?.remove(session_id).map(|entry| entry.data)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn set_cookie(&self, session_id: &str) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name,
            session_id,
            self.ttl.as_secs()
        ))
        .ok()
    }

    pub(crate) fn expired_cookie(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            self.cookie_name
        ))
        .ok()
    }
}

/// Value of cookie `name` in a `Cookie` header.
pub(crate) fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}
