//! Document-store interface the data providers depend on, plus the in-memory
//! and PostgreSQL adapters.
//!
//! A collection holds schemaless JSON documents. Every stored document carries
//! a native identifier ([`DocumentId`]) that the collection exposes under the
//! [`ID_FIELD`] key; providers rename it to `objectId` before handing records
//! to callers.

mod memory;
mod postgres;

pub use memory::MemoryCollection;
pub use postgres::PgCollection;

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// A stored document: field name to value.
pub type Record = Map<String, Value>;

/// Key under which a collection reports a document's native identifier.
pub const ID_FIELD: &str = "_id";

/// Native identifier of a stored document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| StoreError::InvalidId(raw.to_string()))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Equality filter: an optional identifier plus top-level field matches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    pub id: Option<DocumentId>,
    pub fields: Record,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// True when `doc` (as reported by a collection, `_id` included) satisfies the filter.
    pub fn matches(&self, id: &DocumentId, doc: &Record) -> bool {
        if let Some(wanted) = &self.id {
            if wanted != id {
                return false;
            }
        }
        self.fields.iter().all(|(k, v)| doc.get(k) == Some(v))
    }
}

/// Window applied to a `find`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FindOptions {
    pub skip: u64,
    pub limit: u64,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}

/// Narrow storage interface. Implementations own their connections; callers
/// inject a handle and never open or close anything through it.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Persist a new document and return it with its assigned [`ID_FIELD`].
    async fn insert(&self, doc: Record) -> Result<Record, StoreError>;

    /// Matching documents in insertion order, windowed by `options`.
    async fn find(&self, filter: &Filter, options: FindOptions) -> Result<Vec<Record>, StoreError>;

    async fn find_one(&self, filter: &Filter) -> Result<Option<Record>, StoreError>;

    /// Shallow-merge `changes` into matching documents (all of them when `multi`,
    /// otherwise at most one). Returns the number of documents matched.
    async fn update(&self, filter: &Filter, changes: Record, multi: bool) -> Result<u64, StoreError>;

    /// Convert an external string id into the native identifier.
    fn parse_id(&self, raw: &str) -> Result<DocumentId, StoreError> {
        DocumentId::parse(raw)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
