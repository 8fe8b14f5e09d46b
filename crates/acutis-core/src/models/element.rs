use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::field::FieldDefinition;

/// A named, reusable group of field definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FormElement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub fields: Vec<FieldDefinition>,
}

/// A grouping of catalog elements for browsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ElementCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub elements: Vec<FormElement>,
}

/// A custom element as submitted by an administrator. The id is optional;
/// a fresh one is assigned when absent.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewElement {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub fields: Vec<FieldDefinition>,
}

/// Full snapshot of the element library, as persisted and as served.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<jiff::Timestamp>,
    pub categories: Vec<ElementCategory>,
    #[serde(default)]
    pub custom_elements: Vec<FormElement>,
}

/// Outcome of a structural element check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ElementCheck {
    pub valid: bool,
    pub errors: Vec<String>,
}
