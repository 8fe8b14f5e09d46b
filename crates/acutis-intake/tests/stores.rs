use acutis_core::error::ErrorKind;
use acutis_core::keys;
use acutis_core::models::element::NewElement;
use acutis_core::models::field::{FieldDefinition, FieldType};
use acutis_core::models::template::{
    FormSection, FormStep, NewTemplate, TemplateFilter, TemplatePatch, TemplateStatus,
};
use acutis_intake::{IntakeService, ServiceOptions};
use acutis_storage::ObjectStore;
use acutis_storage::fs::FsStore;

const ACTOR: &str = "admin";

fn draft(name: &str, unit: &str) -> NewTemplate {
    NewTemplate {
        name: name.to_string(),
        description: String::new(),
        unit: unit.to_string(),
        form_type: "admission".to_string(),
        version: "2.3".to_string(),
        status: TemplateStatus::Draft,
        steps: vec![FormStep {
            id: "only".to_string(),
            title: "Only".to_string(),
            order: 1,
            sections: vec![FormSection {
                id: "main".to_string(),
                title: "Main".to_string(),
                order: 1,
                fields: vec![FieldDefinition::new(
                    "reason",
                    FieldType::Textarea,
                    "Reason for referral",
                    true,
                )],
                elements: None,
            }],
        }],
    }
}

async fn open(store: ObjectStore) -> IntakeService {
    IntakeService::open(store, ServiceOptions::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn activation_archives_previous_active_template() {
    let service = open(ObjectStore::memory()).await;
    let first = service
        .templates
        .create_template(draft("Detox v1", "detox"), ACTOR)
        .await
        .unwrap();
    let second = service
        .templates
        .create_template(draft("Detox v2", "detox"), ACTOR)
        .await
        .unwrap();

    service
        .templates
        .activate_template(first.id, ACTOR)
        .await
        .unwrap();
    let activation = service
        .templates
        .activate_template(second.id, ACTOR)
        .await
        .unwrap();

    assert_eq!(activation.activated.id, second.id);
    assert_eq!(activation.archived.map(|t| t.id), Some(first.id));

    let active = service
        .templates
        .get_template_by_unit("detox", None)
        .await
        .unwrap();
    assert_eq!(active.id, second.id);

    let archived = service
        .templates
        .list_templates(&TemplateFilter {
            status: Some(TemplateStatus::Archived),
            ..Default::default()
        })
        .await;
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].id, first.id);
}

#[tokio::test]
async fn second_active_template_is_a_conflict() {
    let service = open(ObjectStore::memory()).await;
    let mut active = draft("Alcohol", "alcohol");
    active.status = TemplateStatus::Active;
    service
        .templates
        .create_template(active.clone(), ACTOR)
        .await
        .unwrap();

    let err = service
        .templates
        .create_template(active, ACTOR)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Conflict));

    let other = service
        .templates
        .create_template(draft("Alcohol draft", "alcohol"), ACTOR)
        .await
        .unwrap();
    let err = service
        .templates
        .update_template(
            other.id,
            TemplatePatch {
                status: Some(TemplateStatus::Active),
                ..Default::default()
            },
            ACTOR,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Conflict));
}

#[tokio::test]
async fn duplicate_resets_version_and_status() {
    let service = open(ObjectStore::memory()).await;
    let mut source = draft("Detox", "detox");
    source.status = TemplateStatus::Active;
    let source = service
        .templates
        .create_template(source, ACTOR)
        .await
        .unwrap();

    let copy = service
        .templates
        .duplicate_template(source.id, "Detox (copy)", ACTOR)
        .await
        .unwrap();
    assert_ne!(copy.id, source.id);
    assert_eq!(copy.name, "Detox (copy)");
    assert_eq!(copy.version, "1.0");
    assert_eq!(copy.status, TemplateStatus::Draft);
    assert_eq!(copy.steps, source.steps);
}

#[tokio::test]
async fn delete_removes_the_stored_object() {
    let store = ObjectStore::memory();
    let service = open(store.clone()).await;
    let template = service
        .templates
        .create_template(draft("Detox", "detox"), ACTOR)
        .await
        .unwrap();
    assert!(store.get_object(&keys::template(template.id)).await.is_ok());

    service
        .templates
        .delete_template(template.id, ACTOR)
        .await
        .unwrap();
    assert!(store.get_object(&keys::template(template.id)).await.is_err());
    assert!(
        service
            .templates
            .get_template_by_id(template.id)
            .await
            .is_none()
    );

    let err = service
        .templates
        .delete_template(template.id, ACTOR)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn state_survives_reopening_a_filesystem_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = ObjectStore::Filesystem(FsStore::new(dir.path()));

    let (template_id, element_id, session_id) = {
        let service = open(store.clone()).await;
        let template = service
            .templates
            .create_template(draft("Detox", "detox"), ACTOR)
            .await
            .unwrap();
        service
            .templates
            .activate_template(template.id, ACTOR)
            .await
            .unwrap();
        let element = service
            .library
            .add_custom_element(
                NewElement {
                    id: None,
                    name: "Referral source".to_string(),
                    description: String::new(),
                    fields: vec![FieldDefinition::new(
                        "referralSource",
                        FieldType::Text,
                        "Referral source",
                        false,
                    )],
                },
                ACTOR,
            )
            .await
            .unwrap();
        let session = service
            .sessions
            .start_session(template.id, None, ACTOR)
            .await
            .unwrap();
        service.flush().await.unwrap();
        (template.id, element.id, session.id)
    };

    let reopened = open(store).await;
    let template = reopened
        .templates
        .get_template_by_unit("detox", Some("admission"))
        .await
        .unwrap();
    assert_eq!(template.id, template_id);
    assert_eq!(template.status, TemplateStatus::Active);
    assert!(reopened.library.get_element(&element_id).await.is_some());
    assert!(reopened.library.get_element("element-dob").await.is_some());
    assert_eq!(
        reopened.sessions.resume(session_id).await.unwrap().template_id,
        template_id
    );
}

#[tokio::test]
async fn custom_element_add_and_remove() {
    let service = open(ObjectStore::memory()).await;
    let before = service.library.statistics().await;

    let element = service
        .library
        .add_custom_element(
            NewElement {
                id: Some("element-gp-details".to_string()),
                name: "GP details".to_string(),
                description: "General practitioner contact".to_string(),
                fields: vec![FieldDefinition::new("gpName", FieldType::Text, "GP Name", true)],
            },
            ACTOR,
        )
        .await
        .unwrap();
    assert_eq!(element.id, "element-gp-details");
    assert_eq!(
        service.library.statistics().await.total_elements,
        before.total_elements + 1
    );

    let err = service
        .library
        .add_custom_element(
            NewElement {
                id: Some("element-dob".to_string()),
                name: "Shadow".to_string(),
                description: String::new(),
                fields: vec![FieldDefinition::new("dob", FieldType::Date, "DOB", true)],
            },
            ACTOR,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));

    assert!(
        !service
            .library
            .remove_custom_element("element-dob", ACTOR)
            .await
            .unwrap()
    );
    assert!(
        service
            .library
            .remove_custom_element("element-gp-details", ACTOR)
            .await
            .unwrap()
    );
    assert!(service.library.get_element("element-gp-details").await.is_none());
}

#[tokio::test]
async fn unseeded_library_starts_empty() {
    let service = IntakeService::open(
        ObjectStore::memory(),
        ServiceOptions {
            seed_catalog: false,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(service.library.categories().await.is_empty());
    assert!(service.library.get_element("element-dob").await.is_none());
}
