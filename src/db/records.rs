//! Record adapters between typed models and flat store documents.
//!
//! Write adapters validate and normalize; read adapters never fail and fill
//! every missing field with its default, so documents written by older
//! schemas still load.

use serde_json::Value;

use super::{validate_flat, Collection, Document, Fields};
use crate::errors::AppError;
use crate::models::{
    CanonicalProduct, CategoryInput, CategoryLevel, CategoryNode, Preference, PreferenceRecord,
    Product,
};
use crate::sanitize::{ensure_string, flatten_strings, sanitize};

/// A model that lives in one store collection.
pub trait StoredEntity: Sized + Send {
    const COLLECTION: Collection;

    /// Total read adapter.
    fn from_document(doc: Document) -> Self;
}

impl StoredEntity for Product {
    const COLLECTION: Collection = Collection::Products;

    fn from_document(doc: Document) -> Self {
        product_from_record(doc)
    }
}

impl StoredEntity for Preference {
    const COLLECTION: Collection = Collection::Preferences;

    fn from_document(doc: Document) -> Self {
        preference_from_record(doc)
    }
}

impl StoredEntity for CategoryNode {
    const COLLECTION: Collection = Collection::Categories;

    fn from_document(doc: Document) -> Self {
        category_from_record(doc)
    }
}

fn to_fields(value: Value) -> Result<Fields, AppError> {
    match value {
        Value::Object(fields) => {
            validate_flat(&fields).map_err(AppError::from_write)?;
            Ok(fields)
        }
        _ => Err(AppError::Internal("Record did not serialize to an object".into())),
    }
}

fn text(fields: &Fields, key: &str) -> String {
    ensure_string(fields.get(key).unwrap_or(&Value::Null))
}

// ==================== PRODUCTS ====================

/// Persistable form of a product. Sequence fields are lower-cased again here.
pub fn product_to_record(product: &CanonicalProduct) -> Result<Fields, AppError> {
    let mut normalized = product.clone();
    for item in normalized
        .ingredients
        .iter_mut()
        .chain(normalized.alergen_warning.iter_mut())
    {
        *item = item.to_lowercase();
    }
    to_fields(serde_json::to_value(&normalized).map_err(|e| AppError::Internal(e.to_string()))?)
}

pub fn product_from_record(doc: Document) -> Product {
    Product {
        record: sanitize(&Value::Object(doc.fields)),
        id: doc.key.id,
    }
}

// ==================== PREFERENCES ====================

/// Machine-safe tag derived from free text: lowercase ASCII alphanumerics,
/// every other run collapsed to a single `_`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_sep = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

pub fn preference_to_record(record: &PreferenceRecord) -> Result<Fields, AppError> {
    let name = record.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Preference name is required".into()));
    }

    let type_id = match record.type_id.trim() {
        "" => slugify(name),
        given => given.to_string(),
    };

    let normalized = PreferenceRecord {
        name: name.to_string(),
        kind: record.kind.trim().to_string(),
        type_id,
        ingredients: record
            .ingredients
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    };
    to_fields(serde_json::to_value(&normalized).map_err(|e| AppError::Internal(e.to_string()))?)
}

pub fn preference_from_record(doc: Document) -> Preference {
    let fields = &doc.fields;
    let record = PreferenceRecord {
        name: text(fields, "name"),
        kind: text(fields, "type"),
        type_id: text(fields, "typeId"),
        ingredients: flatten_strings(fields.get("ingredients").unwrap_or(&Value::Null)),
    };
    Preference { id: doc.key.id, record }
}

// ==================== CATEGORIES ====================

/// Persistable form of a taxonomy node. Parent existence is checked by the
/// registry, which can see the other nodes.
pub fn category_to_record(
    input: &CategoryInput,
    created_at: &str,
    updated_at: &str,
) -> Result<Fields, AppError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Category name is required".into()));
    }

    let parent_id = input
        .parent_id
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let mut fields = Fields::new();
    fields.insert("name".into(), Value::from(name));
    fields.insert("level".into(), Value::from(input.level.as_str()));

    match (input.level, parent_id) {
        (CategoryLevel::Subcategory, None) => {
            return Err(AppError::Validation(
                "Subcategory requires a parentId".into(),
            ))
        }
        (CategoryLevel::Subcategory, Some(parent)) => {
            fields.insert("parentId".into(), Value::from(parent));
        }
        (CategoryLevel::Category, Some(_)) => {
            return Err(AppError::Validation(
                "A top-level category cannot have a parentId".into(),
            ))
        }
        (CategoryLevel::Category, None) => {}
    }

    fields.insert("createdAt".into(), Value::from(created_at));
    fields.insert("updatedAt".into(), Value::from(updated_at));
    Ok(fields)
}

pub fn category_from_record(doc: Document) -> CategoryNode {
    let fields = &doc.fields;
    let level = CategoryLevel::parse(&text(fields, "level")).unwrap_or(CategoryLevel::Category);
    let parent_id = match level {
        CategoryLevel::Subcategory => Some(text(fields, "parentId")).filter(|p| !p.is_empty()),
        CategoryLevel::Category => None,
    };

    CategoryNode {
        name: text(fields, "name"),
        level,
        parent_id,
        created_at: text(fields, "createdAt"),
        updated_at: text(fields, "updatedAt"),
        id: doc.key.id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> Document {
        Document::new(id, value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_product_read_fills_legacy_defaults() {
        let product = product_from_record(doc("p1", json!({ "name": "Old", "ingredients": "Salt" })));
        assert_eq!(product.id, "p1");
        assert_eq!(product.record.name, "Old");
        assert_eq!(product.record.brand, "");
        assert_eq!(product.record.ingredients, vec!["salt"]);
        assert!(product.record.alergen_warning.is_empty());
        assert_eq!(product.record.category, "");
    }

    #[test]
    fn test_product_write_lowercases_sequences() {
        let product = CanonicalProduct {
            name: "Bar".into(),
            brand: "B".into(),
            ingredients: vec!["Cocoa".into()],
            alergen_warning: vec!["MILK".into()],
            ..Default::default()
        };
        let fields = product_to_record(&product).unwrap();
        assert_eq!(fields["ingredients"], json!(["cocoa"]));
        assert_eq!(fields["alergen_warning"], json!(["milk"]));
        assert_eq!(fields["image_url"], "");
        assert_eq!(fields.len(), 12);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Gluten Free"), "gluten_free");
        assert_eq!(slugify("  Low--Sugar!! "), "low_sugar");
        assert_eq!(slugify("Végan 2"), "v_gan_2");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_preference_write_normalizes() {
        let record = PreferenceRecord {
            name: " Nut Allergy ".into(),
            kind: "allergy".into(),
            type_id: String::new(),
            ingredients: vec![" peanut ".into(), "".into(), "almond".into()],
        };
        let fields = preference_to_record(&record).unwrap();
        assert_eq!(fields["name"], "Nut Allergy");
        assert_eq!(fields["typeId"], "nut_allergy");
        assert_eq!(fields["ingredients"], json!(["peanut", "almond"]));

        let missing = PreferenceRecord::default();
        assert!(matches!(
            preference_to_record(&missing),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_preference_read_is_total() {
        let pref = preference_from_record(doc("x", json!({ "type": 3 })));
        assert_eq!(pref.record.kind, "3");
        assert_eq!(pref.record.name, "");
        assert!(pref.record.ingredients.is_empty());
    }

    #[test]
    fn test_category_write_checks_parent_rules() {
        let sub = CategoryInput {
            name: "Soda".into(),
            level: CategoryLevel::Subcategory,
            parent_id: None,
        };
        assert!(matches!(
            category_to_record(&sub, "t", "t"),
            Err(AppError::Validation(_))
        ));

        let top = CategoryInput {
            name: "Drinks".into(),
            level: CategoryLevel::Category,
            parent_id: Some("p".into()),
        };
        assert!(category_to_record(&top, "t", "t").is_err());

        let ok = CategoryInput {
            name: "Soda".into(),
            level: CategoryLevel::Subcategory,
            parent_id: Some("p".into()),
        };
        let fields = category_to_record(&ok, "t1", "t2").unwrap();
        assert_eq!(fields["parentId"], "p");
        assert_eq!(fields["level"], "subcategory");
    }

    #[test]
    fn test_category_read_defaults_level() {
        let node = category_from_record(doc("c", json!({ "name": "Misc", "parentId": "z" })));
        assert_eq!(node.level, CategoryLevel::Category);
        assert!(node.parent_id.is_none());
    }
}
