//! Category taxonomy registry.
//!
//! Persisted nodes form a two-level tree: `category` nodes at the top and
//! `subcategory` nodes pointing at one of them. Catalogs that were never
//! explicitly taxonomized get a view derived live from the `category` and
//! `subcategory` strings on their products.

use std::collections::HashMap;
use std::sync::Arc;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{CategoryInput, CategoryLevel, CategoryNode, CategorySummary, Product};

/// Bucket for products with no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Bucket for products with no subcategory.
pub const GENERAL: &str = "General";

#[derive(Clone)]
pub struct CategoryRegistry {
    repo: Arc<Repository>,
}

impl CategoryRegistry {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// All persisted nodes, ordered by name.
    pub async fn list(&self) -> Result<Vec<CategoryNode>, AppError> {
        self.repo.list::<CategoryNode>().await
    }

    pub async fn add(&self, input: &CategoryInput) -> Result<CategoryNode, AppError> {
        self.check_parent(input, None).await?;
        let node = self.repo.create_category(input).await?;
        tracing::info!("Created {} {} ({})", node.level.as_str(), node.name, node.id);
        Ok(node)
    }

    /// Full replace of a node.
    pub async fn update(&self, id: &str, input: &CategoryInput) -> Result<CategoryNode, AppError> {
        let existing = self
            .repo
            .get::<CategoryNode>(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        self.check_parent(input, Some(id)).await?;

        if existing.level == CategoryLevel::Category
            && input.level == CategoryLevel::Subcategory
            && self.has_children(id).await?
        {
            return Err(AppError::Conflict(format!(
                "Category {} still has subcategories",
                existing.name
            )));
        }

        self.repo
            .update_category(id, input, &existing.created_at)
            .await
    }

    /// Delete a node. A category that still has subcategories is kept.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if self.has_children(id).await? {
            return Err(AppError::Conflict(format!(
                "Category {} still has subcategories",
                id
            )));
        }
        self.repo.delete::<CategoryNode>(id).await?;
        tracing::info!("Deleted category node {}", id);
        Ok(())
    }

    /// Read-only taxonomy derived from the stored products.
    pub async fn derive_from_products(&self) -> Result<Vec<CategorySummary>, AppError> {
        let products = self.repo.list::<Product>().await?;
        Ok(derive_summaries(&products))
    }

    /// Derived view merged with the persisted nodes.
    pub async fn overview(&self) -> Result<Vec<CategorySummary>, AppError> {
        let derived = self.derive_from_products().await?;
        let nodes = self.list().await?;
        Ok(merge(derived, &nodes))
    }

    async fn has_children(&self, id: &str) -> Result<bool, AppError> {
        let nodes = self.list().await?;
        Ok(nodes
            .iter()
            .any(|n| n.level == CategoryLevel::Subcategory && n.parent_id.as_deref() == Some(id)))
    }

    async fn check_parent(&self, input: &CategoryInput, own_id: Option<&str>) -> Result<(), AppError> {
        if input.level != CategoryLevel::Subcategory {
            return Ok(());
        }
        let Some(parent_id) = input.parent_id.as_deref().map(str::trim).filter(|p| !p.is_empty())
        else {
            // The write adapter reports the missing parent.
            return Ok(());
        };
        if own_id == Some(parent_id) {
            return Err(AppError::Validation("A node cannot be its own parent".into()));
        }

        match self.repo.get::<CategoryNode>(parent_id).await? {
            Some(parent) if parent.level == CategoryLevel::Category => Ok(()),
            Some(_) => Err(AppError::Validation(format!(
                "Parent {} is not a top-level category",
                parent_id
            ))),
            None => Err(AppError::Validation(format!(
                "Parent category {} does not exist",
                parent_id
            ))),
        }
    }
}

/// Group products by category and subcategory.
///
/// Subcategories keep first-seen order; categories sort by product count
/// descending, then by name.
pub fn derive_summaries(products: &[Product]) -> Vec<CategorySummary> {
    let mut summaries: Vec<CategorySummary> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for product in products {
        let category = non_blank(&product.record.category).unwrap_or(UNCATEGORIZED);
        let subcategory = non_blank(&product.record.subcategory).unwrap_or(GENERAL);

        let slot = *index.entry(category.to_string()).or_insert_with(|| {
            summaries.push(CategorySummary {
                name: category.to_string(),
                product_count: 0,
                subcategories: Vec::new(),
            });
            summaries.len() - 1
        });

        let summary = &mut summaries[slot];
        summary.product_count += 1;
        if !summary.subcategories.iter().any(|s| s == subcategory) {
            summary.subcategories.push(subcategory.to_string());
        }
    }

    sort_summaries(&mut summaries);
    summaries
}

/// Add persisted categories that no product uses, with a zero count.
/// Names already present in `derived` are not duplicated.
pub fn merge(mut derived: Vec<CategorySummary>, nodes: &[CategoryNode]) -> Vec<CategorySummary> {
    for node in nodes.iter().filter(|n| n.level == CategoryLevel::Category) {
        if derived.iter().any(|s| s.name == node.name) {
            continue;
        }
        let subcategories = nodes
            .iter()
            .filter(|n| n.parent_id.as_deref() == Some(node.id.as_str()))
            .map(|n| n.name.clone())
            .collect();
        derived.push(CategorySummary {
            name: node.name.clone(),
            product_count: 0,
            subcategories,
        });
    }

    sort_summaries(&mut derived);
    derived
}

fn sort_summaries(summaries: &mut [CategorySummary]) {
    summaries.sort_by(|a, b| {
        b.product_count
            .cmp(&a.product_count)
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
