//! Salted one-way password hashing (bcrypt). Hashing is deliberately slow, so
//! both directions run on the blocking thread pool instead of the request task.

use crate::error::ProviderError;

pub const DEFAULT_COST: u32 = 10;
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

pub async fn hash_password(plain: &str, cost: u32) -> Result<String, ProviderError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await
        .map_err(|e| ProviderError::Password(e.to_string()))?
        .map_err(|e| ProviderError::Password(e.to_string()))
}

/// `Ok(false)` on mismatch. A stored value that is not a bcrypt hash is also a mismatch.
pub async fn verify_password(plain: &str, hash: &str) -> Result<bool, ProviderError> {
    let plain = plain.to_owned();
    let hash = hash.to_owned();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
        .await
        .map_err(|e| ProviderError::Password(e.to_string()))?;
    Ok(verified.unwrap_or(false))
}
