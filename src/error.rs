//! Typed errors and HTTP mapping.

use crate::response::{Document, ErrorObject, JsonApi};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
    #[error("cache seed {path}: {message}")]
    Seed { path: String, message: String },
}

/// Failure raised by a document collection backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("invalid identifier '{0}'")]
    InvalidId(String),
    /// A unique index rejected the write.
    #[error("duplicate value for {0}")]
    Duplicate(String),
    #[error("backend: {0}")]
    Backend(String),
}

/// Tagged failure returned by every data provider operation. Providers log the
/// cause where it is detected; callers only inspect the variant.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid object id '{0}'")]
    InvalidId(String),
    #[error("not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("password: {0}")]
    Password(String),
}

impl ProviderError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProviderError::NotFound => StatusCode::NOT_FOUND,
            ProviderError::Conflict(_) | ProviderError::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            ProviderError::InvalidId(_) => StatusCode::BAD_REQUEST,
            ProviderError::Store(StoreError::InvalidId(_)) => StatusCode::BAD_REQUEST,
            ProviderError::Store(_) | ProviderError::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Startup and infrastructure errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        JsonApi::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            Document::Errors(vec![ErrorObject::new(self.to_string())]),
        )
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_status_mapping() {
        assert_eq!(ProviderError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ProviderError::Conflict("email".into()).status(), StatusCode::CONFLICT);
        assert_eq!(ProviderError::InvalidId("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProviderError::Store(StoreError::Duplicate("users_email_key".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ProviderError::Store(StoreError::Backend("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
