//! Read-only schema lookup. Schemas are provisioned out of band.

use super::{expose_id, Criteria, FetchOptions, SchemaCache};
use crate::error::{ProviderError, ProviderResult};
use crate::store::{DocumentCollection, FindOptions, Record};
use std::sync::Arc;

pub struct SchemasDataProvider {
    collection: Arc<dyn DocumentCollection>,
    cache: SchemaCache,
}

impl SchemasDataProvider {
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self {
            collection,
            cache: SchemaCache::default(),
        }
    }

    pub fn with_cache(mut self, cache: SchemaCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Cache hits are keyed by `className` alone.
    pub async fn fetch_objects(
        &self,
        criteria: impl Into<Criteria>,
        options: FetchOptions,
    ) -> ProviderResult<Vec<Record>> {
        let criteria = criteria.into();
        if options.cache {
            if let Some(class_name) = &criteria.class_name {
                if let Some(hit) = self.cache.get(class_name) {
                    tracing::debug!(class_name = %class_name, "cache hit in schema fetch_objects");
                    return Ok(vec![hit]);
                }
            }
        }

        let filter = criteria.to_filter(self.collection.as_ref())?;
        tracing::debug!(filter = ?filter, options = ?options, "find by schema fetch_objects");
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
                tracing::error!(filter = ?filter, error = %e, "could not find by schema fetch_objects");
                ProviderError::from(e)
            })?;
        tracing::debug!(count = found.len(), "found by schema fetch_objects");
        Ok(found.into_iter().map(expose_id).collect())
    }

    pub async fn fetch_object(&self, class_name: &str) -> ProviderResult<Record> {
        let found = self
            .fetch_objects(
                class_name,
                FetchOptions {
                    limit: 1,
                    ..FetchOptions::default()
                },
            )
            .await?;
        found.into_iter().next().ok_or(ProviderError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCollection;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn fetch_from_store() {
        let collection = Arc::new(MemoryCollection::new());
        collection
            .insert(rec(json!({"className": "Note", "fields": {"title": "string"}})))
            .await
            .unwrap();
        let p = SchemasDataProvider::new(collection);

        let schema = p.fetch_object("Note").await.unwrap();
        assert_eq!(schema["fields"], json!({"title": "string"}));
        assert!(schema.contains_key("objectId"));
        assert!(matches!(p.fetch_object("Task").await, Err(ProviderError::NotFound)));
    }

    #[tokio::test]
    async fn cache_hit_by_class_name_skips_store() {
        let collection = Arc::new(MemoryCollection::new());
        let mut entries = HashMap::new();
        entries.insert("Note".to_string(), rec(json!({"fields": {"body": "text"}})));
        let p = SchemasDataProvider::new(collection.clone()).with_cache(SchemaCache::new(entries));

        let schema = p.fetch_object("Note").await.unwrap();
        assert_eq!(schema["fields"], json!({"body": "text"}));
        assert_eq!(collection.read_count(), 0);

        let uncached = p.fetch_objects("Note", FetchOptions::uncached()).await.unwrap();
        assert!(uncached.is_empty());
        assert_eq!(collection.read_count(), 1);
    }
}
