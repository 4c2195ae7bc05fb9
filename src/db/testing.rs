//! Store double for failure-path tests.

use async_trait::async_trait;

use super::{Collection, Document, DocumentStore, Fields, MemoryStore, SortKey, StoreError};

/// [`MemoryStore`] that fails on demand.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    /// Inserts whose `category` field equals this value fail.
    pub fail_category: Option<String>,
    pub fail_count: bool,
    pub fail_reads: bool,
}

impl FlakyStore {
    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn insert(&self, collection: Collection, fields: Fields) -> Result<String, StoreError> {
        let category = fields.get("category").and_then(|v| v.as_str());
        if category.is_some() && category == self.fail_category.as_deref() {
            return Err(StoreError::Unavailable("write quota exceeded".into()));
        }
        self.inner.insert(collection, fields).await
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.inner.replace(collection, id, fields).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        self.check_read()?;
        self.inner.get(collection, id).await
    }

    async fn page_after(
        &self,
        collection: Collection,
        after: Option<&SortKey>,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        self.check_read()?;
        self.inner.page_after(collection, after, limit).await
    }

    async fn scan(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        self.check_read()?;
        self.inner.scan(collection).await
    }

    async fn count(&self, collection: Collection) -> Result<usize, StoreError> {
        if self.fail_count {
            return Err(StoreError::Unavailable("count timed out".into()));
        }
        self.inner.count(collection).await
    }
}
