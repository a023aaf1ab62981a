//! User accounts: sign-up with hashed passwords, credential checks, profile updates.

use super::{expose_id, inserted_id, now_millis, Created, Criteria, Updated, CREATED_AT, UPDATED_AT};
use crate::error::{ProviderError, ProviderResult, StoreError};
use crate::password::{hash_password, verify_password, DEFAULT_COST};
use crate::store::{DocumentCollection, Filter, Record};
use serde_json::Value;
use std::sync::Arc;

pub const PASSWORD: &str = "password";

pub struct UsersDataProvider {
    collection: Arc<dyn DocumentCollection>,
    cost: u32,
    unique_field: Option<String>,
}

impl UsersDataProvider {
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self {
            collection,
            cost: DEFAULT_COST,
            unique_field: None,
        }
    }

    /// bcrypt cost factor for newly hashed passwords.
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// Refuse to insert a second user with the same value in `field`.
    pub fn with_unique_field(mut self, field: impl Into<String>) -> Self {
        self.unique_field = Some(field.into());
        self
    }

    /// Hash `password`, stamp `createdAt`, insert.
    pub async fn insert(&self, data: Record) -> ProviderResult<Created> {
        let created_at = now_millis();
        let mut document = data;
        let plain = match document.get(PASSWORD) {
            Some(Value::String(s)) => s.clone(),
            _ => return Err(ProviderError::Password("password is required".into())),
        };

        if let Some(field) = &self.unique_field {
            if let Some(value) = document.get(field).cloned() {
                let filter = Filter::new().with_field(field.clone(), value);
                let existing = self.collection.find_one(&filter).await.map_err(|e| {
                    tracing::error!(field = %field, error = %e, "could not check uniqueness by insert");
                    ProviderError::from(e)
                })?;
                if existing.is_some() {
                    tracing::debug!(field = %field, "user already exists");
                    return Err(ProviderError::Conflict(field.clone()));
                }
            }
        }

        let hash = hash_password(&plain, self.cost).await.map_err(|e| {
            tracing::error!(error = %e, "could not hash password by insert");
            e
        })?;
        document.insert(PASSWORD.to_string(), Value::String(hash));
        document.insert(CREATED_AT.to_string(), Value::from(created_at));
        tracing::debug!(fields = ?document.keys().collect::<Vec<_>>(), "insert user");
        let created = self.collection.insert(document).await.map_err(|e| match e {
            StoreError::Duplicate(index) => {
                tracing::debug!(index = %index, "user already exists");
                ProviderError::Conflict(self.unique_field.clone().unwrap_or(index))
            }
            e => {
                tracing::error!(error = %e, "could not insert user");
                ProviderError::from(e)
            }
        })?;
        Ok(Created {
            object_id: inserted_id(&created)?,
            created_at,
        })
    }

    /// Find one user. A plaintext `password` field in the criteria is checked
    /// against the stored hash; a wrong password and a missing user both yield
    /// [`ProviderError::NotFound`].
    pub async fn find_one(&self, criteria: impl Into<Criteria>) -> ProviderResult<Record> {
        let mut criteria = criteria.into();
        let password = criteria.fields.remove(PASSWORD);
        let filter = criteria.to_filter(self.collection.as_ref())?;
        tracing::debug!(filter = ?filter, "find user by find_one");
        let found = self
            .collection
            .find_one(&filter)
            .await
            .map_err(|e| {
                tracing::error!(filter = ?filter, error = %e, "could not find user by find_one");
                ProviderError::from(e)
            })?
            .ok_or(ProviderError::NotFound)?;

        if let Some(password) = password {
            let Value::String(plain) = password else {
                tracing::debug!("password criterion is not a string");
                return Err(ProviderError::NotFound);
            };
            let stored = found.get(PASSWORD).and_then(Value::as_str).unwrap_or_default();
            if !verify_password(&plain, stored).await? {
                tracing::debug!(filter = ?filter, "specified password is not valid");
                return Err(ProviderError::NotFound);
            }
        }
        Ok(expose_id(found))
    }

    /// Set-style update; stamps `updatedAt` and re-hashes a changed password.
    pub async fn update(&self, criteria: impl Into<Criteria>, changes: Record) -> ProviderResult<Updated> {
        let criteria = criteria.into();
        let updated_at = now_millis();
        let filter = criteria.to_filter(self.collection.as_ref())?;
        let mut changes = changes;
        if let Some(Value::String(plain)) = changes.get(PASSWORD).cloned() {
            let hash = hash_password(&plain, self.cost).await?;
            changes.insert(PASSWORD.to_string(), Value::String(hash));
        }
        changes.insert(UPDATED_AT.to_string(), Value::from(updated_at));
        tracing::debug!(filter = ?filter, fields = ?changes.keys().collect::<Vec<_>>(), "update user");
        let matched = self
            .collection
            .update(&filter, changes, true)
            .await
            .map_err(|e| {
                tracing::error!(filter = ?filter, error = %e, "could not update user");
                ProviderError::from(e)
            })?;
        tracing::debug!(matched, "updated users");
        Ok(Updated { updated_at })
    }
}
