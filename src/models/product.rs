//! Product model.

use serde::{Deserialize, Serialize};

/// Canonical, store-ready product record without its store id.
///
/// Every field is always present; the sequence fields hold lower-cased strings
/// and never nested sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalProduct {
    pub name: String,
    pub brand: String,
    pub barcode: String,
    pub image_url: String,
    pub ingredients: Vec<String>,
    pub alergen_warning: Vec<String>,
    pub net_weight: String,
    pub nutritional_info: String,
    pub manufacturer: String,
    pub origin: String,
    pub category: String,
    pub subcategory: String,
}

impl CanonicalProduct {
    /// Import accept predicate: both `name` and `brand` carry text.
    pub fn has_identity(&self) -> bool {
        !self.name.trim().is_empty() && !self.brand.trim().is_empty()
    }

    pub fn has_barcode(&self) -> bool {
        !self.barcode.trim().is_empty()
    }
}

/// A stored product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(flatten)]
    pub record: CanonicalProduct,
}
