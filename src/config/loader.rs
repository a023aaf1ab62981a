//! Load settings from the environment and cache seeds from JSON files.

use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use crate::provider::{ObjectCache, SchemaCache};
use crate::store::Record;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

impl ServerConfig {
    /// Read settings from process environment variables (after `.env`, if the
    /// caller loaded one with `dotenvy`). Unset variables fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store = StoreConfig {
            database_url: get("DATABASE_URL").unwrap_or(defaults.store.database_url),
            schema: get("BAAS_SCHEMA").unwrap_or(defaults.store.schema),
            objects_table: get("BAAS_OBJECTS_TABLE").unwrap_or(defaults.store.objects_table),
            schemas_table: get("BAAS_SCHEMAS_TABLE").unwrap_or(defaults.store.schemas_table),
            users_table: get("BAAS_USERS_TABLE").unwrap_or(defaults.store.users_table),
            max_connections: match get("DATABASE_MAX_CONNECTIONS") {
                Some(v) => parse_number("DATABASE_MAX_CONNECTIONS", &v)?,
                None => defaults.store.max_connections,
            },
        };
        let auth = AuthConfig {
            login_field: get("LOGIN_FIELD").unwrap_or(defaults.auth.login_field),
            login_if_success: match get("LOGIN_IF_SUCCESS") {
                Some(v) => parse_bool("LOGIN_IF_SUCCESS", &v)?,
                None => defaults.auth.login_if_success,
            },
            bcrypt_cost: match get("BCRYPT_COST") {
                Some(v) => parse_number("BCRYPT_COST", &v)?,
                None => defaults.auth.bcrypt_cost,
            },
            session_cookie: get("SESSION_COOKIE").unwrap_or(defaults.auth.session_cookie),
            session_ttl: match get("SESSION_TTL") {
                Some(v) => Duration::from_secs(parse_number("SESSION_TTL", &v)?.into()),
                None => defaults.auth.session_ttl,
            },
            login_url: get("LOGIN_URL"),
        };
        let cache = CacheConfig {
            objects_seed: get("OBJECTS_CACHE_SEED").map(PathBuf::from),
            schemas_seed: get("SCHEMAS_CACHE_SEED").map(PathBuf::from),
        };
        let config = ServerConfig {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            store,
            auth,
            cache,
        };
        validate(&config)?;
        Ok(config)
    }
}

fn parse_number(key: &'static str, v: &str) -> Result<u32, ConfigError> {
    v.parse().map_err(|_| ConfigError::Invalid {
        key,
        message: format!("'{}' is not a number", v),
    })
}

fn parse_bool(key: &'static str, v: &str) -> Result<bool, ConfigError> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            message: format!("'{}' is not a boolean", v),
        }),
    }
}

async fn read_seed(path: &Path) -> Result<Value, ConfigError> {
    let seed_err = |message: String| ConfigError::Seed {
        path: path.display().to_string(),
        message,
    };
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| seed_err(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| seed_err(e.to_string()))
}

fn as_record(path: &Path, what: &str, v: Value) -> Result<Record, ConfigError> {
    match v {
        Value::Object(m) => Ok(m),
        _ => Err(ConfigError::Seed {
            path: path.display().to_string(),
            message: format!("{} must be a JSON object", what),
        }),
    }
}

/// Object cache seed: `{"<className>": {"<objectId>": {...record}}}`.
pub async fn load_object_cache(path: Option<&Path>) -> Result<ObjectCache, ConfigError> {
    let Some(path) = path else {
        return Ok(ObjectCache::default());
    };
    let root = as_record(path, "seed", read_seed(path).await?)?;
    let mut entries: HashMap<String, HashMap<String, Record>> = HashMap::new();
    for (class_name, by_id) in root {
        let by_id = as_record(path, &format!("class '{}'", class_name), by_id)?;
        let mut records = HashMap::new();
        for (object_id, record) in by_id {
            let record = as_record(path, &format!("object '{}'", object_id), record)?;
            records.insert(object_id, record);
        }
        entries.insert(class_name, records);
    }
    tracing::info!(path = %path.display(), classes = entries.len(), "loaded object cache seed");
    Ok(ObjectCache::new(entries))
}

/// Schema cache seed: `{"<className>": {...schema}}`.
pub async fn load_schema_cache(path: Option<&Path>) -> Result<SchemaCache, ConfigError> {
    let Some(path) = path else {
        return Ok(SchemaCache::default());
    };
    let root = as_record(path, "seed", read_seed(path).await?)?;
    let mut entries = HashMap::new();
    for (class_name, schema) in root {
        let schema = as_record(path, &format!("schema '{}'", class_name), schema)?;
        entries.insert(class_name, schema);
    }
    tracing::info!(path = %path.display(), classes = entries.len(), "loaded schema cache seed");
    Ok(SchemaCache::new(entries))
}
