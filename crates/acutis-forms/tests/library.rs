use acutis_core::models::element::{ElementCategory, FormElement, LibrarySnapshot, NewElement};
use acutis_core::models::field::{FieldDefinition, FieldType};
use acutis_core::models::template::{ElementEntry, FormSection, FormStep, FormTemplate, TemplateStatus};
use acutis_forms::{ElementLibrary, Expander};

fn text(id: &str) -> FieldDefinition {
    FieldDefinition::new(id, FieldType::Text, id, true)
}

fn library_with_collision() -> ElementLibrary {
    let snapshot = LibrarySnapshot {
        version: "1.0".to_string(),
        last_updated: None,
        categories: vec![ElementCategory {
            id: "personal".to_string(),
            name: "Personal".to_string(),
            description: String::new(),
            elements: vec![FormElement {
                id: "element-name".to_string(),
                name: "Catalog name".to_string(),
                description: "From the catalog".to_string(),
                fields: vec![text("firstName")],
            }],
        }],
        custom_elements: vec![FormElement {
            id: "element-name".to_string(),
            name: "Custom name".to_string(),
            description: "Loaded from an older snapshot".to_string(),
            fields: vec![text("nickname")],
        }],
    };
    ElementLibrary::new(snapshot)
}

#[test]
fn catalog_wins_on_id_collision() {
    let library = library_with_collision();
    let element = library.get_element("element-name").unwrap();
    assert_eq!(element.name, "Catalog name");
}

#[test]
fn get_elements_keeps_order_and_drops_unknown_ids() {
    let library = ElementLibrary::seeded();
    let found = library.get_elements(&["element-dob", "nope", "element-name-basic"]);
    let ids: Vec<&str> = found.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["element-dob", "element-name-basic"]);
}

#[test]
fn search_is_case_insensitive_and_lists_catalog_first() {
    let mut library = ElementLibrary::seeded();
    library
        .add_custom_element(NewElement {
            id: Some("custom-contact-pref".to_string()),
            name: "Contact Preferences".to_string(),
            description: "How the resident wants to be reached".to_string(),
            fields: vec![FieldDefinition::new("prefersSms", FieldType::Checkbox, "SMS", false)],
        })
        .unwrap();

    let results = library.search_elements("CONTACT");
    let ids: Vec<&str> = results.iter().map(|e| e.id.as_str()).collect();
    assert!(ids.contains(&"element-contact-basic"));
    assert!(ids.contains(&"element-emergency-contact"));
    assert_eq!(ids.last(), Some(&"custom-contact-pref"));

    let by_id = library.search_elements("custom-contact");
    assert_eq!(by_id.len(), 1);
}

#[test]
fn validate_element_requires_explicit_required_flag() {
    let mut field = text("firstName");
    field.required = None;
    let element = FormElement {
        id: String::new(),
        name: "Name".to_string(),
        description: String::new(),
        fields: vec![field],
    };

    let check = ElementLibrary::validate_element(&element);
    assert!(!check.valid);
    assert!(check.errors.iter().any(|e| e == "Element must have an ID"));
    assert!(
        check
            .errors
            .iter()
            .any(|e| e == "Field missing required flag: firstName")
    );
}

#[test]
fn validate_element_rejects_choice_fields_without_options() {
    let element = FormElement {
        id: "custom-1".to_string(),
        name: "Choice".to_string(),
        description: String::new(),
        fields: vec![FieldDefinition::new("pick", FieldType::Select, "Pick", true)],
    };
    let check = ElementLibrary::validate_element(&element);
    assert_eq!(check.errors, ["Field missing options: pick"]);
}

#[test]
fn add_custom_element_reports_every_problem() {
    let mut library = ElementLibrary::seeded();
    let err = library
        .add_custom_element(NewElement {
            id: None,
            name: String::new(),
            description: String::new(),
            fields: vec![FieldDefinition::new("", FieldType::Text, "", true)],
        })
        .unwrap_err();
    let acutis_core::error::FormError::Validation(errors) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(errors.len(), 3);
}

#[test]
fn remove_only_touches_custom_elements() {
    let mut library = ElementLibrary::seeded();
    let added = library
        .add_custom_element(NewElement {
            id: None,
            name: "Extra".to_string(),
            description: String::new(),
            fields: vec![text("extra")],
        })
        .unwrap();

    assert!(!library.remove_custom_element("element-dob"));
    assert!(library.get_element("element-dob").is_some());
    assert!(library.remove_custom_element(&added.id));
    assert!(!library.remove_custom_element(&added.id));
}

#[test]
fn expand_element_ids_flattens_fields() {
    let library = ElementLibrary::seeded();
    let fields = library.expand_element_ids(&["element-name-basic", "element-dob"]);
    let ids: Vec<&str> = fields.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["firstName", "surname", "preferredName", "dateOfBirth"]);
}

#[test]
fn seeded_catalog_expands_into_a_renderable_template() {
    let library = ElementLibrary::seeded();
    let now = jiff::Timestamp::now();
    let template = FormTemplate {
        id: uuid::Uuid::new_v4(),
        name: "Detox admission".to_string(),
        description: String::new(),
        unit: "detox".to_string(),
        form_type: "admission".to_string(),
        version: "1.0".to_string(),
        status: TemplateStatus::Draft,
        steps: vec![FormStep {
            id: "personal".to_string(),
            title: "Personal".to_string(),
            order: 1,
            sections: vec![FormSection {
                id: "identity".to_string(),
                title: "Identity".to_string(),
                order: 1,
                fields: Vec::new(),
                elements: Some(vec![
                    ElementEntry::Reference("element-name-basic".to_string()),
                    ElementEntry::Inline(FieldDefinition::new(
                        "ppsNumber",
                        FieldType::Text,
                        "PPS Number",
                        false,
                    )),
                    ElementEntry::Reference("element-retired".to_string()),
                ]),
            }],
        }],
        created_at: now,
        updated_at: now,
    };

    let expanded = Expander::new(&library).expand(&template);
    let ids: Vec<&str> = expanded.steps[0].fields().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["firstName", "surname", "preferredName", "ppsNumber"]);
}
