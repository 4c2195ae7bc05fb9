//! Category taxonomy models.

use serde::{Deserialize, Serialize};

/// Position of a node in the two-level taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryLevel {
    Category,
    Subcategory,
}

impl CategoryLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryLevel::Category => "category",
            CategoryLevel::Subcategory => "subcategory",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "category" => Some(CategoryLevel::Category),
            "subcategory" => Some(CategoryLevel::Subcategory),
            _ => None,
        }
    }
}

/// A persisted taxonomy node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub id: String,
    pub name: String,
    pub level: CategoryLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating or replacing a taxonomy node.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    pub level: CategoryLevel,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Consumer-facing view of one category, derived or persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub product_count: usize,
    pub subcategories: Vec<String>,
}
