//! In-memory document collection.
//!
//! Keeps documents in insertion order with no persistence. Useful for tests
//! and ephemeral deployments. Uses `RwLock<Vec>` for thread-safe access.
//! An optional unique field mirrors a unique index on the PostgreSQL side.

use super::{DocumentCollection, DocumentId, Filter, FindOptions, Record, ID_FIELD};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryCollection {
    docs: RwLock<Vec<(DocumentId, Record)>>,
    reads: AtomicU64,
    unique_field: Option<String>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject inserts whose `field` value is already stored.
    pub fn with_unique_field(mut self, field: impl Into<String>) -> Self {
        self.unique_field = Some(field.into());
        self
    }

    /// Number of `find`/`find_one` calls served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("collection lock poisoned".into())
    }
}

fn with_id(id: &DocumentId, doc: &Record) -> Record {
    let mut out = doc.clone();
    out.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    out
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    async fn insert(&self, mut doc: Record) -> Result<Record, StoreError> {
        doc.remove(ID_FIELD);
        let id = DocumentId::generate();
        let stored = with_id(&id, &doc);
        let mut docs = self.docs.write().map_err(|_| Self::poisoned())?;
        if let Some(field) = &self.unique_field {
            if let Some(value) = doc.get(field) {
                if docs.iter().any(|(_, existing)| existing.get(field) == Some(value)) {
                    return Err(StoreError::Duplicate(field.clone()));
                }
            }
        }
        docs.push((id, doc));
        Ok(stored)
    }

    async fn find(&self, filter: &Filter, options: FindOptions) -> Result<Vec<Record>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let docs = self.docs.read().map_err(|_| Self::poisoned())?;
        Ok(docs
            .iter()
            .filter(|(id, doc)| filter.matches(id, doc))
            .skip(options.skip as usize)
            .take(options.limit as usize)
            .map(|(id, doc)| with_id(id, doc))
            .collect())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Record>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let docs = self.docs.read().map_err(|_| Self::poisoned())?;
        Ok(docs
            .iter()
            .find(|(id, doc)| filter.matches(id, doc))
            .map(|(id, doc)| with_id(id, doc)))
    }

    async fn update(&self, filter: &Filter, mut changes: Record, multi: bool) -> Result<u64, StoreError> {
        changes.remove(ID_FIELD);
        let mut docs = self.docs.write().map_err(|_| Self::poisoned())?;
        let mut matched = 0;
        for (id, doc) in docs.iter_mut() {
            if !filter.matches(id, doc) {
                continue;
            }
            for (k, v) in &changes {
                doc.insert(k.clone(), v.clone());
            }
            matched += 1;
            if !multi {
                break;
            }
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_find_returns_it() {
        let c = MemoryCollection::new();
        let created = c.insert(doc(json!({"className": "Note", "n": 1}))).await.unwrap();
        let id = created[ID_FIELD].as_str().unwrap().to_string();

        let found = c
            .find(&Filter::new().with_id(DocumentId::parse(&id).unwrap()), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["n"], json!(1));
        assert_eq!(found[0][ID_FIELD], json!(id));
    }

    #[tokio::test]
    async fn unique_field_rejects_second_insert() {
        let c = MemoryCollection::new().with_unique_field("email");
        c.insert(doc(json!({"email": "a@b.com"}))).await.unwrap();
        let err = c.insert(doc(json!({"email": "a@b.com"}))).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(field) if field == "email"));
        c.insert(doc(json!({"email": "c@d.com"}))).await.unwrap();
        c.insert(doc(json!({"name": "no email"}))).await.unwrap();
        assert_eq!(c.len(), 3);
    }

    #[tokio::test]
    async fn find_applies_skip_and_limit_in_insertion_order() {
        let c = MemoryCollection::new();
        for n in 0..5 {
            c.insert(doc(json!({"className": "Note", "n": n}))).await.unwrap();
        }
        c.insert(doc(json!({"className": "Task", "n": 99}))).await.unwrap();

        let page = c
            .find(
                &Filter::new().with_field("className", "Note"),
                FindOptions { skip: 1, limit: 2 },
            )
            .await
            .unwrap();
        let ns: Vec<_> = page.iter().map(|d| d["n"].clone()).collect();
        assert_eq!(ns, vec![json!(1), json!(2)]);
        assert_eq!(c.read_count(), 1);
    }

    #[tokio::test]
    async fn update_multi_and_single() {
        let c = MemoryCollection::new();
        for _ in 0..3 {
            c.insert(doc(json!({"className": "Note"}))).await.unwrap();
        }
        let filter = Filter::new().with_field("className", "Note");

        let one = c.update(&filter, doc(json!({"seen": true})), false).await.unwrap();
        assert_eq!(one, 1);
        let all = c.update(&filter, doc(json!({"tag": "x"})), true).await.unwrap();
        assert_eq!(all, 3);

        let docs = c.find(&filter, FindOptions::default()).await.unwrap();
        assert!(docs.iter().all(|d| d["tag"] == json!("x")));
        assert_eq!(docs.iter().filter(|d| d.contains_key("seen")).count(), 1);
    }

    #[tokio::test]
    async fn update_without_match_reports_zero() {
        let c = MemoryCollection::new();
        let n = c
            .update(&Filter::new().with_id(DocumentId::generate()), doc(json!({"a": 1})), true)
            .await
            .unwrap();
        assert_eq!(n, 0);
    }
}
