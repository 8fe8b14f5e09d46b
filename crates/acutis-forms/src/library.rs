use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

use acutis_core::error::FormError;
use acutis_core::models::element::{
    ElementCategory, ElementCheck, FormElement, LibrarySnapshot, NewElement,
};
use acutis_core::models::field::FieldDefinition;

use crate::catalog;

/// Counts shown on the library dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStatistics {
    pub total_elements: usize,
    pub custom_elements: usize,
    pub categories_count: usize,
    pub by_category: BTreeMap<String, usize>,
}

/// The catalog of reusable form elements plus administrator-defined ones.
///
/// Lookups search catalog categories first, then custom elements, so a
/// custom element can never shadow a catalog entry with the same id.
#[derive(Debug, Clone, Default)]
pub struct ElementLibrary {
    snapshot: LibrarySnapshot,
}

impl ElementLibrary {
    pub fn new(snapshot: LibrarySnapshot) -> Self {
        Self { snapshot }
    }

    /// A library holding only the built-in catalog.
    pub fn seeded() -> Self {
        Self::new(catalog::seed_snapshot())
    }

    pub fn snapshot(&self) -> &LibrarySnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> LibrarySnapshot {
        self.snapshot
    }

    pub fn categories(&self) -> &[ElementCategory] {
        &self.snapshot.categories
    }

    pub fn category(&self, category_id: &str) -> Option<&ElementCategory> {
        self.snapshot.categories.iter().find(|c| c.id == category_id)
    }

    /// Elements of one category; empty when the category does not exist.
    pub fn elements_by_category(&self, category_id: &str) -> &[FormElement] {
        self.category(category_id)
            .map(|c| c.elements.as_slice())
            .unwrap_or_default()
    }

    pub fn custom_elements(&self) -> &[FormElement] {
        &self.snapshot.custom_elements
    }

    fn catalog_elements(&self) -> impl Iterator<Item = &FormElement> {
        self.snapshot.categories.iter().flat_map(|c| c.elements.iter())
    }

    fn all_elements(&self) -> impl Iterator<Item = &FormElement> {
        self.catalog_elements()
            .chain(self.snapshot.custom_elements.iter())
    }

    pub fn get_element(&self, element_id: &str) -> Option<&FormElement> {
        self.all_elements().find(|e| e.id == element_id)
    }

    /// Resolve ids in input order. Ids that resolve to nothing are dropped
    /// and logged.
    pub fn get_elements<S: AsRef<str>>(&self, element_ids: &[S]) -> Vec<&FormElement> {
        element_ids
            .iter()
            .filter_map(|id| {
                let id = id.as_ref();
                let found = self.get_element(id);
                if found.is_none() {
                    tracing::warn!(element_id = %id, "unresolved element reference dropped");
                }
                found
            })
            .collect()
    }

    /// The fields of the given elements, concatenated in order.
    pub fn expand_element_ids<S: AsRef<str>>(&self, element_ids: &[S]) -> Vec<FieldDefinition> {
        self.get_elements(element_ids)
            .into_iter()
            .flat_map(|e| e.fields.iter().cloned())
            .collect()
    }

    /// Case-insensitive substring search over name, description and id.
    /// Catalog matches come before custom matches.
    pub fn search_elements(&self, query: &str) -> Vec<&FormElement> {
        let needle = query.to_lowercase();
        self.all_elements()
            .filter(|e| {
                e.name.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle)
                    || e.id.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn popular_elements(&self, limit: usize) -> Vec<&FormElement> {
        let ids = &catalog::POPULAR_ELEMENT_IDS[..limit.min(catalog::POPULAR_ELEMENT_IDS.len())];
        self.get_elements(ids)
    }

    pub fn statistics(&self) -> LibraryStatistics {
        let by_category: BTreeMap<String, usize> = self
            .snapshot
            .categories
            .iter()
            .map(|c| (c.name.clone(), c.elements.len()))
            .collect();
        let catalog_total: usize = by_category.values().sum();

        LibraryStatistics {
            total_elements: catalog_total + self.snapshot.custom_elements.len(),
            custom_elements: self.snapshot.custom_elements.len(),
            categories_count: self.snapshot.categories.len(),
            by_category,
        }
    }

    /// Structural check of an element definition.
    pub fn validate_element(element: &FormElement) -> ElementCheck {
        let mut errors = Vec::new();

        if element.id.trim().is_empty() {
            errors.push("Element must have an ID".to_string());
        }
        if element.name.trim().is_empty() {
            errors.push("Element must have a name".to_string());
        }

        let mut seen = HashSet::new();
        for (position, field) in element.fields.iter().enumerate() {
            let label = if field.id.is_empty() {
                format!("#{position}")
            } else {
                field.id.clone()
            };

            if field.id.trim().is_empty() {
                errors.push(format!("Field missing ID: {label}"));
            } else if !seen.insert(field.id.as_str()) {
                errors.push(format!("Duplicate field ID: {label}"));
            }
            if field.label.trim().is_empty() {
                errors.push(format!("Field missing label: {label}"));
            }
            if field.required.is_none() {
                errors.push(format!("Field missing required flag: {label}"));
            }
            if field.field_type.requires_options()
                && field.options.as_ref().is_none_or(|o| o.is_empty())
            {
                errors.push(format!("Field missing options: {label}"));
            }
            if let Some(pattern) = field.validation.as_ref().and_then(|v| v.pattern.as_ref())
                && Regex::new(pattern).is_err()
            {
                errors.push(format!("Field has an invalid pattern: {label}"));
            }
        }

        ElementCheck {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Check an element as submitted, before it is known to be well formed.
    /// Missing keys are reported the way blank ones are.
    pub fn validate_element_value(value: &serde_json::Value) -> ElementCheck {
        match serde_json::from_value::<FormElement>(value.clone()) {
            Ok(element) => Self::validate_element(&element),
            Err(parse_error) => {
                let mut errors = missing_keys(value);
                if errors.is_empty() {
                    errors.push(format!("Element is malformed: {parse_error}"));
                }
                ElementCheck {
                    valid: false,
                    errors,
                }
            }
        }
    }

    /// Validate and append a custom element, assigning an id when absent.
    pub fn add_custom_element(&mut self, new: NewElement) -> Result<FormElement, FormError> {
        let element = FormElement {
            id: new
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(fresh_custom_id),
            name: new.name,
            description: new.description,
            fields: new.fields,
        };

        let check = Self::validate_element(&element);
        if !check.valid {
            return Err(FormError::Validation(check.errors));
        }
        if self.get_element(&element.id).is_some() {
            return Err(FormError::validation(format!(
                "element id already in use: {}",
                element.id
            )));
        }

        self.snapshot.custom_elements.push(element.clone());
        self.touch();
        Ok(element)
    }

    /// Remove a custom element. Catalog elements are never removed.
    pub fn remove_custom_element(&mut self, element_id: &str) -> bool {
        let Some(index) = self
            .snapshot
            .custom_elements
            .iter()
            .position(|e| e.id == element_id)
        else {
            return false;
        };
        self.snapshot.custom_elements.remove(index);
        self.touch();
        true
    }

    /// Deep copy of an element under a fresh custom id. Not added to the
    /// library until passed to [`Self::add_custom_element`].
    pub fn clone_element(&self, element_id: &str, new_name: &str) -> Option<FormElement> {
        let original = self.get_element(element_id)?;
        Some(FormElement {
            id: fresh_custom_id(),
            name: new_name.to_string(),
            description: format!("Customized from: {}", original.name),
            fields: original.fields.clone(),
        })
    }

    fn touch(&mut self) {
        self.snapshot.last_updated = Some(jiff::Timestamp::now());
    }
}

fn fresh_custom_id() -> String {
    format!("custom-{}", Uuid::new_v4().simple())
}

fn missing_keys(value: &serde_json::Value) -> Vec<String> {
    let Some(element) = value.as_object() else {
        return vec!["Element must be a JSON object".to_string()];
    };

    let mut errors = Vec::new();
    if !element.contains_key("id") {
        errors.push("Element must have an ID".to_string());
    }
    if !element.contains_key("name") {
        errors.push("Element must have a name".to_string());
    }

    let Some(fields) = element.get("fields").and_then(|f| f.as_array()) else {
        errors.push("Element must have a list of fields".to_string());
        return errors;
    };
    for (position, field) in fields.iter().enumerate() {
        let label = field
            .get("id")
            .and_then(|id| id.as_str())
            .filter(|id| !id.is_empty())
            .map_or_else(|| format!("#{position}"), str::to_string);
        let Some(field) = field.as_object() else {
            errors.push(format!("Field is not an object: {label}"));
            continue;
        };
        for (key, message) in [
            ("id", "Field missing ID"),
            ("type", "Field missing type"),
            ("label", "Field missing label"),
            ("required", "Field missing required flag"),
        ] {
            if !field.contains_key(key) {
                errors.push(format!("{message}: {label}"));
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use acutis_core::models::field::FieldType;

    fn custom(id: Option<&str>, name: &str) -> NewElement {
        NewElement {
            id: id.map(str::to_string),
            name: name.to_string(),
            description: "custom element".to_string(),
            fields: vec![FieldDefinition::new("note", FieldType::Text, "Note", false)],
        }
    }

    #[test]
    fn unknown_category_yields_no_elements() {
        let library = ElementLibrary::seeded();
        assert!(library.elements_by_category("nope").is_empty());
        assert!(!library.elements_by_category("consent").is_empty());
    }

    #[test]
    fn popular_elements_respect_limit() {
        let library = ElementLibrary::seeded();
        let popular = library.popular_elements(3);
        let ids: Vec<&str> = popular.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            ["element-name-basic", "element-contact-basic", "element-dob"]
        );
        assert_eq!(library.popular_elements(100).len(), 10);
    }

    #[test]
    fn statistics_count_custom_elements() {
        let mut library = ElementLibrary::seeded();
        let before = library.statistics();
        library.add_custom_element(custom(None, "Extra")).unwrap();
        let after = library.statistics();

        assert_eq!(after.custom_elements, 1);
        assert_eq!(after.total_elements, before.total_elements + 1);
        assert_eq!(after.categories_count, before.categories_count);
    }

    #[test]
    fn add_assigns_custom_ids() {
        let mut library = ElementLibrary::new(LibrarySnapshot::default());
        let added = library.add_custom_element(custom(None, "Extra")).unwrap();
        assert!(added.id.starts_with("custom-"));
        assert!(library.snapshot().last_updated.is_some());
    }

    #[test]
    fn add_rejects_ids_already_in_use() {
        let mut library = ElementLibrary::seeded();
        let err = library
            .add_custom_element(custom(Some("element-dob"), "Shadow"))
            .unwrap_err();
        assert!(matches!(err, FormError::Validation(_)));
    }

    #[test]
    fn clone_is_detached_until_added() {
        let library = ElementLibrary::seeded();
        let cloned = library.clone_element("element-dob", "DOB (teen unit)").unwrap();
        assert_eq!(cloned.description, "Customized from: Date of Birth");
        assert!(library.get_element(&cloned.id).is_none());
        assert_eq!(
            cloned.fields,
            library.get_element("element-dob").unwrap().fields
        );
    }

    #[test]
    fn raw_element_reports_missing_keys() {
        let value = serde_json::json!({
            "id": "element-partial",
            "name": "Partial",
            "fields": [
                { "id": "firstName", "type": "text", "required": true },
                { "label": "Surname", "type": "text", "required": true }
            ]
        });
        let check = ElementLibrary::validate_element_value(&value);
        assert!(!check.valid);
        assert_eq!(
            check.errors,
            ["Field missing label: firstName", "Field missing ID: #1"]
        );
    }

    #[test]
    fn raw_element_that_parses_gets_the_full_check() {
        let value = serde_json::json!({
            "id": "element-ok",
            "name": "",
            "fields": [{ "id": "note", "type": "text", "label": "Note" }]
        });
        let check = ElementLibrary::validate_element_value(&value);
        assert_eq!(
            check.errors,
            ["Element must have a name", "Field missing required flag: note"]
        );

        let check = ElementLibrary::validate_element_value(&serde_json::json!([1, 2]));
        assert_eq!(check.errors, ["Element must be a JSON object"]);
    }
}
