//! Document store abstraction.
//!
//! The store holds independently addressable JSON documents grouped into
//! collections. Documents are flat: every field is a scalar or an array of
//! scalars. Range reads are ordered by `(name, id)` and resume after a
//! [`SortKey`]; there is no text index.

mod memory;
mod records;
mod repository;
mod sqlite;
#[cfg(test)]
pub mod testing;

pub use memory::MemoryStore;
pub use records::*;
pub use repository::*;
pub use sqlite::{init_database, SqliteStore};

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Field name every collection is ordered by.
pub const SORT_FIELD: &str = "name";

/// Field map of one stored document.
pub type Fields = Map<String, Value>;

/// Named group of documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Products,
    Preferences,
    Categories,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Preferences => "preferences",
            Collection::Categories => "categories",
        }
    }
}

/// Position of a document in collection order. Ties on `name` break on `id`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    pub name: String,
    pub id: String,
}

impl SortKey {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Key of a document with the given fields. A missing or non-string
    /// `name` sorts as the empty string.
    pub fn of(fields: &Fields, id: &str) -> Self {
        let name = fields
            .get(SORT_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default();
        Self::new(name, id)
    }
}

/// A stored document.
///
/// `key` is the position the store holds the document at. It is fixed when
/// the document is written and survives a body that later fails to decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: SortKey,
    pub fields: Fields,
}

impl Document {
    /// Document keyed by the `name` in its own fields.
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        let id: String = id.into();
        let key = SortKey::of(&fields, &id);
        Self { key, fields }
    }
}

/// Errors raised by a store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend unreachable or the query failed.
    Unavailable(String),
    /// Write refused because the document is not flat.
    Rejected(String),
    /// No document with the given id.
    NotFound(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::Rejected(msg) => write!(f, "write rejected: {}", msg),
            StoreError::NotFound(msg) => write!(f, "not found: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        StoreError::Unavailable(err.to_string())
    }
}

/// Backend contract the rest of the crate is written against.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a new document under a freshly generated id and return the id.
    async fn insert(&self, collection: Collection, fields: Fields) -> Result<String, StoreError>;

    /// Replace every field of an existing document.
    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Up to `limit` documents strictly after `after`, in collection order.
    async fn page_after(
        &self,
        collection: Collection,
        after: Option<&SortKey>,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError>;

    /// Every document of the collection, in collection order.
    async fn scan(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, collection: Collection) -> Result<usize, StoreError>;
}

/// Refuse documents that are not flat.
pub fn validate_flat(fields: &Fields) -> Result<(), StoreError> {
    for (key, value) in fields {
        match value {
            Value::Object(_) => {
                return Err(StoreError::Rejected(format!(
                    "Nested objects not allowed. Field: {}",
                    key
                )))
            }
            Value::Array(items) => {
                if items.iter().any(|item| item.is_array() || item.is_object()) {
                    return Err(StoreError::Rejected(format!(
                        "Nested arrays not allowed. Field: {}",
                        key
                    )));
                }
            }
            _ => {}
        }
    }
    Ok(())
}
