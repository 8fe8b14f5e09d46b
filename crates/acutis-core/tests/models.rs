use acutis_core::error::{ErrorKind, FormError};
use acutis_core::models::field::{FieldType, FieldValue};
use acutis_core::models::session::{IntakeSession, SessionState};
use acutis_core::models::template::{ElementEntry, FormTemplate, TemplateFilter, TemplateStatus};
use serde_json::json;

fn template_json() -> serde_json::Value {
    json!({
        "id": "7f1c3a52-7d6f-4a52-9d7c-2f0a1e4b8c11",
        "name": "Detox admission",
        "unit": "detox",
        "version": "3",
        "status": "active",
        "createdAt": "2026-01-05T09:00:00Z",
        "updatedAt": "2026-01-05T09:00:00Z",
        "steps": [{
            "id": "personal",
            "title": "Personal details",
            "order": 1,
            "sections": [{
                "id": "identity",
                "title": "Identity",
                "order": 1,
                "elements": [
                    "element-name-basic",
                    {
                        "id": "gender",
                        "type": "select",
                        "label": "Gender",
                        "required": false,
                        "options": [{ "value": "f", "label": "Female" }]
                    }
                ]
            }]
        }]
    })
}

#[test]
fn templates_parse_mixed_element_lists() {
    let template: FormTemplate = serde_json::from_value(template_json()).unwrap();

    assert_eq!(template.form_type, "admission");
    assert_eq!(template.status, TemplateStatus::Active);
    assert!(!template.is_expanded());

    let entries = template.steps[0].sections[0].elements.as_ref().unwrap();
    assert_eq!(entries[0], ElementEntry::Reference("element-name-basic".to_string()));
    let ElementEntry::Inline(field) = &entries[1] else {
        panic!("expected an inline field");
    };
    assert_eq!(field.field_type, FieldType::Select);
    assert_eq!(field.required, Some(false));
}

#[test]
fn sections_without_elements_serialize_without_the_key() {
    let mut template: FormTemplate = serde_json::from_value(template_json()).unwrap();
    template.steps[0].sections[0].elements = None;

    let value = serde_json::to_value(&template).unwrap();
    let section = &value["steps"][0]["sections"][0];
    assert!(section.get("elements").is_none());
    assert_eq!(section["fields"], json!([]));
}

#[test]
fn missing_required_flag_is_preserved_as_none() {
    let field: acutis_core::models::field::FieldDefinition =
        serde_json::from_value(json!({ "id": "x", "type": "text", "label": "X" })).unwrap();
    assert_eq!(field.required, None);
    assert!(!field.is_required());
}

#[test]
fn field_values_keep_their_json_shape() {
    let values: Vec<FieldValue> =
        serde_json::from_value(json!([true, 3, "text", ["a", "b"]])).unwrap();
    assert_eq!(
        values,
        vec![
            FieldValue::Bool(true),
            FieldValue::Number(3.0),
            FieldValue::Text("text".to_string()),
            FieldValue::List(vec!["a".to_string(), "b".to_string()]),
        ]
    );
    assert!(!FieldValue::Number(0.0).is_truthy());
    assert!(!FieldValue::Number(0.0).is_empty());
}

#[test]
fn session_state_follows_completion() {
    let now = jiff::Timestamp::now();
    let mut session = IntakeSession::new(uuid::Uuid::new_v4(), Some("adm-12".to_string()), now);
    assert_eq!(session.state(), SessionState::InProgress { step_index: 0 });

    session.completed_at = Some(now);
    assert_eq!(session.state(), SessionState::Completed);

    let value = serde_json::to_value(&session).unwrap();
    assert_eq!(value["admissionId"], "adm-12");
    assert_eq!(value["currentStepIndex"], 0);
}

#[test]
fn filters_combine_unit_and_status() {
    let template: FormTemplate = serde_json::from_value(template_json()).unwrap();
    let filter = TemplateFilter {
        unit: Some("detox".to_string()),
        status: Some(TemplateStatus::Draft),
        ..Default::default()
    };
    assert!(!filter.matches(&template));
    assert!(TemplateFilter::default().matches(&template));
}

#[test]
fn error_kinds_and_recoverability() {
    let not_found = FormError::not_found("session", "abc");
    assert_eq!(not_found.to_string(), "session not found: abc");
    assert!(not_found.is_recoverable());

    let conflict = FormError::Conflict("slot taken".to_string());
    assert_eq!(conflict.kind(), ErrorKind::Conflict);
    assert!(!conflict.is_recoverable());
}
