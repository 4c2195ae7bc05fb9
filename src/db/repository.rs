//! Typed repository over a [`DocumentStore`].
//!
//! Every read goes through the total read adapters and every write through
//! the validating write adapters. Store errors are translated here.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;

use super::{
    category_to_record, preference_to_record, product_to_record, Document, DocumentStore, Fields,
    SortKey, StoredEntity,
};
use crate::errors::AppError;
use crate::models::{
    CanonicalProduct, CategoryInput, CategoryNode, Preference, PreferenceRecord, Product,
};

/// An entity together with its position in collection order.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyed<T> {
    pub key: SortKey,
    pub item: T,
}

impl<T: StoredEntity> Keyed<T> {
    fn from_document(doc: Document) -> Self {
        Self {
            key: doc.key.clone(),
            item: T::from_document(doc),
        }
    }
}

/// Repository for all catalog data.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // ==================== GENERIC OPERATIONS ====================

    pub async fn get<T: StoredEntity>(&self, id: &str) -> Result<Option<T>, AppError> {
        let doc = self.store.get(T::COLLECTION, id).await?;
        Ok(doc.map(T::from_document))
    }

    /// Up to `limit` entities after `after`, in `(name, id)` order.
    pub async fn page_after<T: StoredEntity>(
        &self,
        after: Option<&SortKey>,
        limit: usize,
    ) -> Result<Vec<Keyed<T>>, AppError> {
        let docs = self.store.page_after(T::COLLECTION, after, limit).await?;
        Ok(docs.into_iter().map(Keyed::from_document).collect())
    }

    /// The whole collection, in `(name, id)` order.
    pub async fn scan<T: StoredEntity>(&self) -> Result<Vec<Keyed<T>>, AppError> {
        let docs = self.store.scan(T::COLLECTION).await?;
        Ok(docs.into_iter().map(Keyed::from_document).collect())
    }

    pub async fn list<T: StoredEntity>(&self) -> Result<Vec<T>, AppError> {
        let docs = self.store.scan(T::COLLECTION).await?;
        Ok(docs.into_iter().map(T::from_document).collect())
    }

    pub async fn count<T: StoredEntity>(&self) -> Result<usize, AppError> {
        Ok(self.store.count(T::COLLECTION).await?)
    }

    pub async fn delete<T: StoredEntity>(&self, id: &str) -> Result<(), AppError> {
        self.store
            .delete(T::COLLECTION, id)
            .await
            .map_err(AppError::from_write)
    }

    async fn insert<T: StoredEntity>(&self, fields: Fields) -> Result<T, AppError> {
        let id = self
            .store
            .insert(T::COLLECTION, fields.clone())
            .await
            .map_err(AppError::from_write)?;
        Ok(T::from_document(Document::new(id, fields)))
    }

    async fn replace<T: StoredEntity>(&self, id: &str, fields: Fields) -> Result<T, AppError> {
        self.store
            .replace(T::COLLECTION, id, fields.clone())
            .await
            .map_err(AppError::from_write)?;
        Ok(T::from_document(Document::new(id, fields)))
    }

    // ==================== PRODUCT OPERATIONS ====================

    pub async fn create_product(&self, product: &CanonicalProduct) -> Result<Product, AppError> {
        self.insert(product_to_record(product)?).await
    }

    /// Full replace of an existing product.
    pub async fn update_product(
        &self,
        id: &str,
        product: &CanonicalProduct,
    ) -> Result<Product, AppError> {
        self.replace(id, product_to_record(product)?).await
    }

    /// Sorted unique non-empty brands across all products.
    pub async fn distinct_brands(&self) -> Result<Vec<String>, AppError> {
        let products = self.list::<Product>().await?;
        let brands: BTreeSet<String> = products
            .into_iter()
            .map(|p| p.record.brand)
            .filter(|b| !b.trim().is_empty())
            .collect();
        Ok(brands.into_iter().collect())
    }

    // ==================== PREFERENCE OPERATIONS ====================

    pub async fn create_preference(
        &self,
        record: &PreferenceRecord,
    ) -> Result<Preference, AppError> {
        self.insert(preference_to_record(record)?).await
    }

    pub async fn update_preference(
        &self,
        id: &str,
        record: &PreferenceRecord,
    ) -> Result<Preference, AppError> {
        self.replace(id, preference_to_record(record)?).await
    }

    // ==================== CATEGORY OPERATIONS ====================

    pub async fn create_category(&self, input: &CategoryInput) -> Result<CategoryNode, AppError> {
        let now = Utc::now().to_rfc3339();
        self.insert(category_to_record(input, &now, &now)?).await
    }

    /// Full replace of a node, keeping its original creation time.
    pub async fn update_category(
        &self,
        id: &str,
        input: &CategoryInput,
        created_at: &str,
    ) -> Result<CategoryNode, AppError> {
        let now = Utc::now().to_rfc3339();
        self.replace(id, category_to_record(input, created_at, &now)?)
            .await
    }
}
