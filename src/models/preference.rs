//! Dietary preference / allergy tag set model.

use serde::{Deserialize, Serialize};

/// Preference fields without the store id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreferenceRecord {
    pub name: String,
    /// Free-form tag such as "diet" or "allergy".
    #[serde(rename = "type")]
    pub kind: String,
    pub type_id: String,
    pub ingredients: Vec<String>,
}

/// A stored preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    pub id: String,
    #[serde(flatten)]
    pub record: PreferenceRecord,
}
