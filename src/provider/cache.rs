//! Read-through lookup caches seeded at construction.
//!
//! Nothing in the request path writes to these; they are a static snapshot.
//! `invalidate` is the only way an entry ever goes away.

use crate::store::Record;
use std::collections::HashMap;
use std::sync::RwLock;

/// `className -> objectId -> record`.
#[derive(Debug, Default)]
pub struct ObjectCache {
    entries: RwLock<HashMap<String, HashMap<String, Record>>>,
}

impl ObjectCache {
    pub fn new(entries: HashMap<String, HashMap<String, Record>>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn get(&self, class_name: &str, object_id: &str) -> Option<Record> {
        let entries = self.entries.read().ok()?;
        entries.get(class_name)?.get(object_id).cloned()
    }

    /// Drop one entry so the next fetch goes to the store. Returns whether it was cached.
    pub fn invalidate(&self, class_name: &str, object_id: &str) -> bool {
        let Ok(mut entries) = self.entries.write() else {
            return false;
        };
        let Some(by_id) = entries.get_mut(class_name) else {
            return false;
        };
        let removed = by_id.remove(object_id).is_some();
        if by_id.is_empty() {
            entries.remove(class_name);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .map(|e| e.values().map(HashMap::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `className -> schema record`.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<String, Record>>,
}

impl SchemaCache {
    pub fn new(entries: HashMap<String, Record>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn get(&self, class_name: &str) -> Option<Record> {
        self.entries.read().ok()?.get(class_name).cloned()
    }

    pub fn invalidate(&self, class_name: &str) -> bool {
        self.entries
            .write()
            .map(|mut e| e.remove(class_name).is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: serde_json::Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn object_cache_get_and_invalidate() {
        let mut by_id = HashMap::new();
        by_id.insert("a".to_string(), rec(json!({"title": "A"})));
        by_id.insert("b".to_string(), rec(json!({"title": "B"})));
        let mut classes = HashMap::new();
        classes.insert("Note".to_string(), by_id);
        let cache = ObjectCache::new(classes);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("Note", "a").unwrap()["title"], json!("A"));
        assert!(cache.get("Note", "c").is_none());
        assert!(cache.get("Task", "a").is_none());

        assert!(cache.invalidate("Note", "a"));
        assert!(!cache.invalidate("Note", "a"));
        assert!(cache.get("Note", "a").is_none());
        assert!(cache.invalidate("Note", "b"));
        assert!(cache.is_empty());
    }

    #[test]
    fn schema_cache_get_and_invalidate() {
        let mut entries = HashMap::new();
        entries.insert("Note".to_string(), rec(json!({"fields": ["title"]})));
        let cache = SchemaCache::new(entries);
        assert!(cache.get("Note").is_some());
        assert!(cache.invalidate("Note"));
        assert!(cache.get("Note").is_none());
        assert!(cache.is_empty());
    }
}
