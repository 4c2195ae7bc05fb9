//! Normalization of untrusted product JSON into [`CanonicalProduct`].
//!
//! Source files are loosely structured: keys may be missing, values may be
//! numbers, objects or arbitrarily nested arrays, and some exports carry a
//! byte-order mark glued to the `name` key. Every branch here degrades to an
//! empty string or empty list, so [`sanitize`] never fails.

use serde_json::{Map, Value};

use crate::models::CanonicalProduct;

/// `name` key as written by spreadsheet exports that keep the UTF-8 BOM.
pub const BOM_NAME_KEY: &str = "\u{feff}name";

/// Legacy spelling accepted as a source for `alergen_warning`.
pub const LEGACY_ALLERGEN_KEY: &str = "allergen_warning";

/// Normalize one raw record. Non-object input yields an all-empty record.
pub fn sanitize(raw: &Value) -> CanonicalProduct {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let text = |key: &str| ensure_string(obj.get(key).unwrap_or(&Value::Null));

    CanonicalProduct {
        name: ensure_string(pick(obj, "name", BOM_NAME_KEY)),
        brand: text("brand"),
        barcode: text("barcode"),
        image_url: text("image_url"),
        ingredients: lowercase_all(flatten_strings(obj.get("ingredients").unwrap_or(&Value::Null))),
        alergen_warning: lowercase_all(flatten_strings(pick(
            obj,
            "alergen_warning",
            LEGACY_ALLERGEN_KEY,
        ))),
        net_weight: text("net_weight"),
        nutritional_info: text("nutritional_info"),
        manufacturer: text("manufacturer"),
        origin: text("origin"),
        category: text("category"),
        subcategory: text("subcategory"),
    }
}

/// Coerce any JSON value to a single string.
///
/// `null` becomes empty, objects become their JSON text, arrays are joined
/// with `", "` after coercing each element.
pub fn ensure_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(ensure_string)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
    }
}

/// Flatten arbitrarily nested arrays into one list of strings, leaves in
/// left-to-right order. A non-array value becomes a one-element list; `null`
/// and the empty string become an empty list.
pub fn flatten_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            collect_leaves(items, &mut out);
            out
        }
        other => vec![ensure_string(other)],
    }
}

fn collect_leaves(items: &[Value], out: &mut Vec<String>) {
    for item in items {
        match item {
            Value::Array(nested) => collect_leaves(nested, out),
            Value::Null => {}
            other => out.push(ensure_string(other)),
        }
    }
}

fn lowercase_all(items: Vec<String>) -> Vec<String> {
    items.into_iter().map(|s| s.to_lowercase()).collect()
}

/// Primary key unless it is absent, `null` or an empty string; then the alias.
fn pick<'a>(obj: &'a Map<String, Value>, primary: &str, alias: &str) -> &'a Value {
    match obj.get(primary) {
        Some(Value::Null) | None => obj.get(alias).unwrap_or(&Value::Null),
        Some(Value::String(s)) if s.is_empty() => obj.get(alias).unwrap_or(&Value::Null),
        Some(v) => v,
    }
}
