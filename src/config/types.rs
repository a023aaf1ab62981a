//! Typed server settings.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct StoreConfig {
    pub database_url: String,
    /// PostgreSQL schema holding the document tables.
    pub schema: String,
    pub objects_table: String,
    pub schemas_table: String,
    pub users_table: String,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/baas".into(),
            schema: "baas".into(),
            objects_table: "objects".into(),
            schemas_table: "schemas".into(),
            users_table: "users".into(),
            max_connections: 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AuthConfig {
    /// Attribute that doubles as the login identifier.
    pub login_field: String,
    /// Whether a successful sign-up immediately establishes a session.
    pub login_if_success: bool,
    pub bcrypt_cost: u32,
    pub session_cookie: String,
    /// Idle lifetime of a session.
    pub session_ttl: Duration,
    /// Where the auth guard redirects unauthenticated requests.
    pub login_url: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_field: "email".into(),
            login_if_success: true,
            bcrypt_cost: crate::password::DEFAULT_COST,
            session_cookie: "baas.sid".into(),
            session_ttl: crate::session::DEFAULT_SESSION_TTL,
            login_url: None,
        }
    }
}

/// JSON files holding the initial read-through caches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CacheConfig {
    pub objects_seed: Option<PathBuf>,
    pub schemas_seed: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub cache: CacheConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            store: StoreConfig::default(),
            auth: AuthConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}
