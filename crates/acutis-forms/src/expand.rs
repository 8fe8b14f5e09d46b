use std::collections::HashSet;

use acutis_core::models::field::FieldDefinition;
use acutis_core::models::template::{ElementEntry, FormStep, FormTemplate};

use crate::library::ElementLibrary;

/// Inlines element references into concrete field lists.
pub struct Expander<'a> {
    library: &'a ElementLibrary,
}

impl<'a> Expander<'a> {
    pub fn new(library: &'a ElementLibrary) -> Self {
        Self { library }
    }

    /// Expand every section of `template`.
    ///
    /// Sections carrying an `elements` list get a `fields` list built from it
    /// and lose the `elements` list. Sections without one are untouched, so
    /// expanding an expanded template returns it unchanged. References that
    /// do not resolve are dropped with a warning, as are field ids that
    /// end up repeated within a step.
    pub fn expand(&self, template: &FormTemplate) -> FormTemplate {
        let template_id = template.id.to_string();
        let mut expanded = template.clone();
        for step in &mut expanded.steps {
            let mut spliced = false;
            for section in &mut step.sections {
                if let Some(entries) = section.elements.take() {
                    let fields = self.resolve_entries(&template_id, &section.id, &entries);
                    section.fields = fields;
                    spliced = true;
                }
            }
            if spliced {
                warn_duplicate_fields(&template_id, step);
            }
        }
        expanded
    }

    fn resolve_entries(
        &self,
        template_id: &str,
        section_id: &str,
        entries: &[ElementEntry],
    ) -> Vec<FieldDefinition> {
        let mut fields = Vec::new();
        for entry in entries {
            match entry {
                ElementEntry::Reference(element_id) => match self.library.get_element(element_id) {
                    Some(element) => fields.extend(element.fields.iter().cloned()),
                    None => tracing::warn!(
                        template_id = %template_id,
                        section_id = %section_id,
                        element_id = %element_id,
                        "unresolved element reference dropped during expansion"
                    ),
                },
                ElementEntry::Inline(field) => fields.push(field.clone()),
            }
        }
        fields
    }
}

fn warn_duplicate_fields(template_id: &str, step: &FormStep) {
    for field_id in duplicate_field_ids(step) {
        tracing::warn!(
            template_id = %template_id,
            step_id = %step.id,
            field_id = %field_id,
            "duplicate field id in expanded step"
        );
    }
}

/// Field ids that appear more than once in a step's flattened field list.
/// Two referenced elements can bring the same id into one step, and their
/// answers then share a single key.
pub fn duplicate_field_ids(step: &FormStep) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for field in step.fields() {
        if !seen.insert(field.id.as_str()) && !duplicates.contains(&field.id) {
            duplicates.push(field.id.clone());
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use acutis_core::models::element::{LibrarySnapshot, NewElement};
    use acutis_core::models::field::FieldType;
    use acutis_core::models::template::{FormSection, FormStep, TemplateStatus};
    use uuid::Uuid;

    fn text(id: &str) -> FieldDefinition {
        FieldDefinition::new(id, FieldType::Text, id, false)
    }

    fn library() -> ElementLibrary {
        let mut library = ElementLibrary::new(LibrarySnapshot::default());
        for (id, fields) in [("e1", ["a", "b"]), ("e2", ["c", "d"])] {
            library
                .add_custom_element(NewElement {
                    id: Some(id.to_string()),
                    name: id.to_string(),
                    description: String::new(),
                    fields: fields.iter().map(|f| text(f)).collect(),
                })
                .unwrap();
        }
        library
    }

    fn template(entries: Vec<ElementEntry>) -> FormTemplate {
        let now = jiff::Timestamp::now();
        FormTemplate {
            id: Uuid::new_v4(),
            name: "Intake".to_string(),
            description: String::new(),
            unit: "detox".to_string(),
            form_type: "admission".to_string(),
            version: "1.0".to_string(),
            status: TemplateStatus::Draft,
            steps: vec![FormStep {
                id: "s1".to_string(),
                title: "Step".to_string(),
                order: 1,
                sections: vec![FormSection {
                    id: "sec".to_string(),
                    title: "Section".to_string(),
                    order: 1,
                    fields: Vec::new(),
                    elements: Some(entries),
                }],
            }],
            created_at: now,
            updated_at: now,
        }
    }

    fn field_ids(template: &FormTemplate) -> Vec<String> {
        template.steps[0].sections[0]
            .fields
            .iter()
            .map(|f| f.id.clone())
            .collect()
    }

    #[test]
    fn references_splice_in_order() {
        let library = library();
        let expanded = Expander::new(&library).expand(&template(vec![
            ElementEntry::Reference("e1".to_string()),
            ElementEntry::Reference("e2".to_string()),
        ]));
        assert_eq!(field_ids(&expanded), ["a", "b", "c", "d"]);
        assert!(expanded.is_expanded());
    }

    #[test]
    fn inline_fields_pass_through_between_references() {
        let library = library();
        let expanded = Expander::new(&library).expand(&template(vec![
            ElementEntry::Reference("e2".to_string()),
            ElementEntry::Inline(text("x")),
            ElementEntry::Reference("e1".to_string()),
        ]));
        assert_eq!(field_ids(&expanded), ["c", "d", "x", "a", "b"]);
    }

    #[test]
    fn missing_references_leave_an_empty_section() {
        let library = library();
        let expanded = Expander::new(&library)
            .expand(&template(vec![ElementEntry::Reference("missing-id".to_string())]));
        assert!(field_ids(&expanded).is_empty());
        assert!(expanded.steps[0].sections[0].elements.is_none());
    }

    #[test]
    fn repeated_field_ids_across_references_are_reported() {
        let library = library();
        let expanded = Expander::new(&library).expand(&template(vec![
            ElementEntry::Reference("e1".to_string()),
            ElementEntry::Inline(text("x")),
            ElementEntry::Reference("e1".to_string()),
        ]));
        assert_eq!(field_ids(&expanded), ["a", "b", "x", "a", "b"]);
        assert_eq!(duplicate_field_ids(&expanded.steps[0]), ["a", "b"]);

        let clean = Expander::new(&library).expand(&template(vec![
            ElementEntry::Reference("e1".to_string()),
            ElementEntry::Reference("e2".to_string()),
        ]));
        assert!(duplicate_field_ids(&clean.steps[0]).is_empty());
    }

    #[test]
    fn expansion_is_idempotent() {
        let library = library();
        let expander = Expander::new(&library);
        let once = expander.expand(&template(vec![
            ElementEntry::Reference("e1".to_string()),
            ElementEntry::Inline(text("x")),
        ]));
        assert_eq!(expander.expand(&once), once);
    }
}
