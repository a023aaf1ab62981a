//! Config validation: SQL identifiers, login field, hashing cost.

use crate::config::ServerConfig;
use crate::error::ConfigError;
use regex::Regex;

const IDENTIFIER_PATTERN: &str = "^[A-Za-z_][A-Za-z0-9_]*$";

pub fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
    let ident = Regex::new(IDENTIFIER_PATTERN).map_err(|e| ConfigError::Invalid {
        key: "identifier pattern",
        message: e.to_string(),
    })?;
    let store = &config.store;
    for (key, value) in [
        ("BAAS_SCHEMA", &store.schema),
        ("BAAS_OBJECTS_TABLE", &store.objects_table),
        ("BAAS_SCHEMAS_TABLE", &store.schemas_table),
        ("BAAS_USERS_TABLE", &store.users_table),
    ] {
        if !ident.is_match(value) {
            return Err(ConfigError::Invalid {
                key,
                message: format!("'{}' is not a valid identifier", value),
            });
        }
    }
    if store.max_connections == 0 {
        return Err(ConfigError::Invalid {
            key: "DATABASE_MAX_CONNECTIONS",
            message: "must be at least 1".into(),
        });
    }

    let auth = &config.auth;
    if auth.login_field.trim().is_empty() {
        return Err(ConfigError::Invalid {
            key: "LOGIN_FIELD",
            message: "must not be empty".into(),
        });
    }
    if auth.login_field == "password" {
        return Err(ConfigError::Invalid {
            key: "LOGIN_FIELD",
            message: "cannot be the password field".into(),
        });
    }
    if !(crate::password::MIN_COST..=crate::password::MAX_COST).contains(&auth.bcrypt_cost) {
        return Err(ConfigError::Invalid {
            key: "BCRYPT_COST",
            message: format!("must be within {}..={}", crate::password::MIN_COST, crate::password::MAX_COST),
        });
    }
    if auth.session_cookie.is_empty()
        || !auth
            .session_cookie
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ConfigError::Invalid {
            key: "SESSION_COOKIE",
            message: format!("'{}' is not a valid cookie name", auth.session_cookie),
        });
    }
    if auth.session_ttl.is_zero() {
        return Err(ConfigError::Invalid {
            key: "SESSION_TTL",
            message: "must be at least one second".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn rejects_unsafe_table_name() {
        let mut config = ServerConfig::default();
        config.store.objects_table = "objects; DROP TABLE users".into();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Invalid { key: "BAAS_OBJECTS_TABLE", .. })
        ));
    }

    #[test]
    fn rejects_cost_out_of_range() {
        let mut config = ServerConfig::default();
        config.auth.bcrypt_cost = 2;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_password_as_login_field() {
        let mut config = ServerConfig::default();
        config.auth.login_field = "password".into();
        assert!(validate(&config).is_err());
    }
}
