//! Generic objects partitioned by `className`, with soft delete and a
//! read-through cache keyed by `className` and `objectId`.

use super::{
    expose_id, inserted_id, now_millis, Created, Criteria, Deleted, FetchOptions, ObjectCache, Updated, CLASS_NAME,
    CREATED_AT, DELETED_AT, UPDATED_AT,
};
use crate::error::{ProviderError, ProviderResult};
use crate::store::{DocumentCollection, FindOptions, Record};
use serde_json::Value;
use std::sync::Arc;

pub struct ObjectsDataProvider {
    collection: Arc<dyn DocumentCollection>,
    cache: ObjectCache,
}

impl ObjectsDataProvider {
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self {
            collection,
            cache: ObjectCache::default(),
        }
    }

    pub fn with_cache(mut self, cache: ObjectCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &ObjectCache {
        &self.cache
    }

    pub fn collection(&self) -> &Arc<dyn DocumentCollection> {
        &self.collection
    }

    /// Stamp `className` and `createdAt`, then insert.
    pub async fn create_object(&self, class_name: &str, data: Record) -> ProviderResult<Created> {
        let created_at = now_millis();
        let mut document = data;
        document.insert(CLASS_NAME.to_string(), Value::String(class_name.to_string()));
        document.insert(CREATED_AT.to_string(), Value::from(created_at));
        tracing::debug!(class_name = %class_name, document = ?document, "insert by create_object");
        let created = self.collection.insert(document).await.map_err(|e| {
            tracing::error!(class_name = %class_name, error = %e, "could not insert by create_object");
            ProviderError::from(e)
        })?;
        Ok(Created {
            object_id: inserted_id(&created)?,
            created_at,
        })
    }

    /// A cache hit on `{className, objectId}` returns that single entry without
    /// touching the store, whatever other fields the criteria carry.
    pub async fn fetch_objects(
        &self,
        criteria: impl Into<Criteria>,
        options: FetchOptions,
    ) -> ProviderResult<Vec<Record>> {
        let criteria = criteria.into();
        if options.cache {
            if let (Some(class_name), Some(object_id)) = (&criteria.class_name, &criteria.object_id) {
                if let Some(hit) = self.cache.get(class_name, object_id) {
                    tracing::debug!(class_name = %class_name, object_id = %object_id, "cache hit in fetch_objects");
                    return Ok(vec![hit]);
                }
            }
        }

        let filter = criteria.to_filter(self.collection.as_ref())?;
        tracing::debug!(filter = ?filter, options = ?options, "find by fetch_objects");
        let found = self
            .collection
            .find(
                &filter,
                FindOptions {
                    skip: options.skip,
                    limit: options.limit,
                },
            )
            .await
            .map_err(|e| {
                tracing::error!(filter = ?filter, error = %e, "could not find by fetch_objects");
                ProviderError::from(e)
            })?;
        tracing::debug!(count = found.len(), "found by fetch_objects");
        Ok(found.into_iter().map(expose_id).collect())
    }

    pub async fn fetch_object(&self, class_name: &str, object_id: &str) -> ProviderResult<Record> {
        let found = self
            .fetch_objects(
                Criteria::class(class_name).with_object_id(object_id),
                FetchOptions {
                    limit: 1,
                    ..FetchOptions::default()
                },
            )
            .await?;
        found.into_iter().next().ok_or(ProviderError::NotFound)
    }

    /// Set-style update of every matching object; always stamps `updatedAt`.
    /// `className` and `createdAt` are never changed.
    pub async fn update_object(&self, criteria: impl Into<Criteria>, data: Record) -> ProviderResult<Updated> {
        let criteria = criteria.into();
        let updated_at = now_millis();
        let filter = criteria.to_filter(self.collection.as_ref())?;
        let mut changes = data;
        changes.remove(CLASS_NAME);
        changes.remove(CREATED_AT);
        changes.insert(UPDATED_AT.to_string(), Value::from(updated_at));
        tracing::debug!(filter = ?filter, changes = ?changes, "update by update_object");
        let matched = self
            .collection
            .update(&filter, changes, true)
            .await
            .map_err(|e| {
                tracing::error!(filter = ?filter, error = %e, "could not update by update_object");
                ProviderError::from(e)
            })?;
        tracing::debug!(matched, "updated by update_object");
        Ok(Updated { updated_at })
    }

    /// Soft delete: stamps `deletedAt`; the document stays in the store.
    pub async fn delete_object(&self, class_name: &str, object_id: &str) -> ProviderResult<Deleted> {
        let deleted_at = now_millis();
        let mut changes = Record::new();
        changes.insert(DELETED_AT.to_string(), Value::from(deleted_at));
        self.update_object(Criteria::class(class_name).with_object_id(object_id), changes)
            .await?;
        Ok(Deleted { deleted_at })
    }
}
