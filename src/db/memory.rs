//! In-process document store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{validate_flat, Collection, Document, DocumentStore, Fields, SortKey, StoreError};

/// Document store kept in memory; contents vanish with the process.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn ordered(&self, collection: Collection) -> Vec<Document> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(&collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        docs.sort_by(|a, b| a.key.cmp(&b.key));
        docs
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: Collection, fields: Fields) -> Result<String, StoreError> {
        validate_flat(&fields)?;
        let id = uuid::Uuid::new_v4().to_string();
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(id.clone(), Document::new(id.clone(), fields));
        Ok(id)
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        validate_flat(&fields)?;
        let mut collections = self.collections.write().await;
        match collections.get_mut(&collection).and_then(|docs| docs.get_mut(id)) {
            Some(existing) => {
                *existing = Document::new(id, fields);
                Ok(())
            }
            None => Err(StoreError::NotFound(format!(
                "{} {} not found",
                collection.as_str(),
                id
            ))),
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(&collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("{} {} not found", collection.as_str(), id)))
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn page_after(
        &self,
        collection: Collection,
        after: Option<&SortKey>,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .ordered(collection)
            .await
            .into_iter()
            .filter(|doc| after.map_or(true, |key| &doc.key > key))
            .take(limit)
            .collect())
    }

    async fn scan(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        Ok(self.ordered(collection).await)
    }

    async fn count(&self, collection: Collection) -> Result<usize, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).map_or(0, BTreeMap::len))
    }
}
