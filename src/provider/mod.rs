//! Data providers: CRUD over a [`DocumentCollection`] with tagged results.
//!
//! Every operation returns [`ProviderResult`]. Store failures, malformed ids,
//! and missing records are logged where they are detected and come back as
//! `Err`; nothing panics across this boundary.

mod cache;
mod objects;
mod schemas;
mod users;

pub use cache::{ObjectCache, SchemaCache};
pub use objects::ObjectsDataProvider;
pub use schemas::SchemasDataProvider;
pub use users::{UsersDataProvider, PASSWORD};

use crate::attributes::OBJECT_ID;
use crate::error::{ProviderError, ProviderResult};
use crate::store::{DocumentCollection, Filter, Record, ID_FIELD};
use serde_json::Value;

pub const CLASS_NAME: &str = "className";
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
pub const DELETED_AT: &str = "deletedAt";

/// What to fetch or update: an optional class, an optional external id, and
/// plain equality fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Criteria {
    pub class_name: Option<String>,
    pub object_id: Option<String>,
    pub fields: Record,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ..Self::default()
        }
    }

    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Build native filter criteria, parsing `object_id` with the collection's id parser.
    fn to_filter(&self, collection: &dyn DocumentCollection) -> ProviderResult<Filter> {
        let mut filter = Filter {
            id: None,
            fields: self.fields.clone(),
        };
        if let Some(class_name) = &self.class_name {
            filter.fields.insert(CLASS_NAME.to_string(), Value::String(class_name.clone()));
        }
        if let Some(object_id) = &self.object_id {
            let id = collection.parse_id(object_id).map_err(|e| {
                tracing::error!(object_id = %object_id, error = %e, "could not parse objectId");
                ProviderError::InvalidId(object_id.clone())
            })?;
            filter.id = Some(id);
        }
        Ok(filter)
    }
}

/// A bare class name is shorthand for `{className}`.
impl From<&str> for Criteria {
    fn from(class_name: &str) -> Self {
        Criteria::class(class_name)
    }
}

impl From<String> for Criteria {
    fn from(class_name: String) -> Self {
        Criteria::class(class_name)
    }
}

/// `className` and `objectId` keys (when strings) become the typed parts; the rest stay as fields.
impl From<Record> for Criteria {
    fn from(mut fields: Record) -> Self {
        let mut take = |key: &str| match fields.remove(key) {
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                fields.insert(key.to_string(), other);
                None
            }
            None => None,
        };
        let class_name = take(CLASS_NAME);
        let object_id = take(OBJECT_ID);
        Criteria {
            class_name,
            object_id,
            fields,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    pub cache: bool,
    pub skip: u64,
    pub limit: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cache: true,
            skip: 0,
            limit: 100,
        }
    }
}

impl FetchOptions {
    pub fn uncached() -> Self {
        Self {
            cache: false,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Created {
    pub object_id: String,
    pub created_at: i64,
}

impl Created {
    /// `{objectId, createdAt}` as a record, ready for the attribute formatter.
    pub fn to_record(&self) -> Record {
        let mut r = Record::new();
        r.insert(OBJECT_ID.to_string(), Value::String(self.object_id.clone()));
        r.insert(CREATED_AT.to_string(), Value::from(self.created_at));
        r
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Updated {
    pub updated_at: i64,
}

impl Updated {
    pub fn to_record(&self) -> Record {
        let mut r = Record::new();
        r.insert(UPDATED_AT.to_string(), Value::from(self.updated_at));
        r
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deleted {
    pub deleted_at: i64,
}

impl Deleted {
    pub fn to_record(&self) -> Record {
        let mut r = Record::new();
        r.insert(DELETED_AT.to_string(), Value::from(self.deleted_at));
        r
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Rename the store's `_id` to `objectId`.
pub(crate) fn expose_id(mut record: Record) -> Record {
    if let Some(id) = record.remove(ID_FIELD) {
        record.insert(OBJECT_ID.to_string(), id);
    }
    record
}

pub(crate) fn inserted_id(record: &Record) -> ProviderResult<String> {
    match record.get(ID_FIELD) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(ProviderError::Store(crate::error::StoreError::Backend(
            "insert did not report an identifier".into(),
        ))),
    }
}
