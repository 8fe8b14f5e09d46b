use jiff::Timestamp;
use tokio::sync::RwLock;
use uuid::Uuid;

use acutis_audit::AuditEvent;
use acutis_core::keys;
use acutis_core::models::template::{FormTemplate, NewTemplate, TemplateFilter, TemplatePatch};
use acutis_forms::TemplateRegistry;
use acutis_forms::registry::Activation;
use acutis_storage::{ObjectStore, state};

use crate::error::IntakeError;

/// Form templates, held in memory and written through to the store.
///
/// Every mutation runs against a copy of the registry under the write lock
/// and only replaces it once the changed objects are persisted, so the
/// one-active-template-per-slot check and the write it guards cannot
/// interleave with another mutation.
pub struct TemplateStore {
    store: ObjectStore,
    registry: RwLock<TemplateRegistry>,
}

impl TemplateStore {
    pub async fn load(store: ObjectStore) -> Result<Self, IntakeError> {
        let loaded: Vec<(FormTemplate, String)> =
            state::load_all(&store, keys::TEMPLATES_PREFIX).await?;
        let registry = TemplateRegistry::from_templates(loaded.into_iter().map(|(t, _)| t));
        tracing::info!(templates = registry.len(), "form templates loaded");

        Ok(Self {
            store,
            registry: RwLock::new(registry),
        })
    }

    pub async fn get_template_by_id(&self, id: Uuid) -> Option<FormTemplate> {
        self.registry.read().await.get(id).cloned()
    }

    pub async fn get_template_by_unit(
        &self,
        unit: &str,
        form_type: Option<&str>,
    ) -> Option<FormTemplate> {
        self.registry
            .read()
            .await
            .get_by_unit(unit, form_type)
            .cloned()
    }

    pub async fn list_templates(&self, filter: &TemplateFilter) -> Vec<FormTemplate> {
        self.registry
            .read()
            .await
            .list(filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn create_template(
        &self,
        new: NewTemplate,
        actor: &str,
    ) -> Result<FormTemplate, IntakeError> {
        let mut registry = self.registry.write().await;
        let mut next = registry.clone();
        let template = next.create(new, Timestamp::now())?;

        self.persist(&template).await?;
        *registry = next;

        AuditEvent::new("template.create", "template", template.id.to_string(), actor)
            .with_details(serde_json::json!({
                "name": template.name,
                "unit": template.unit,
                "version": template.version,
            }))
            .emit();
        Ok(template)
    }

    pub async fn update_template(
        &self,
        id: Uuid,
        patch: TemplatePatch,
        actor: &str,
    ) -> Result<FormTemplate, IntakeError> {
        let mut registry = self.registry.write().await;
        let mut next = registry.clone();
        let template = next.update(id, patch, Timestamp::now())?;

        self.persist(&template).await?;
        *registry = next;

        AuditEvent::new("template.update", "template", id.to_string(), actor)
            .with_details(serde_json::json!({
                "version": template.version,
                "status": template.status,
            }))
            .emit();
        Ok(template)
    }

    pub async fn delete_template(&self, id: Uuid, actor: &str) -> Result<(), IntakeError> {
        let mut registry = self.registry.write().await;
        let mut next = registry.clone();
        next.delete(id)?;

        self.store.delete_object(&keys::template(id)).await?;
        *registry = next;

        AuditEvent::new("template.delete", "template", id.to_string(), actor).emit();
        Ok(())
    }

    pub async fn duplicate_template(
        &self,
        id: Uuid,
        new_name: &str,
        actor: &str,
    ) -> Result<FormTemplate, IntakeError> {
        let mut registry = self.registry.write().await;
        let mut next = registry.clone();
        let copy = next.duplicate(id, new_name, Timestamp::now())?;

        self.persist(&copy).await?;
        *registry = next;

        AuditEvent::new("template.duplicate", "template", copy.id.to_string(), actor)
            .with_details(serde_json::json!({ "source_id": id }))
            .emit();
        Ok(copy)
    }

    pub async fn activate_template(
        &self,
        id: Uuid,
        actor: &str,
    ) -> Result<Activation, IntakeError> {
        let mut registry = self.registry.write().await;
        let mut next = registry.clone();
        let activation = next.activate(id, Timestamp::now())?;

        if let Some(archived) = &activation.archived {
            self.persist(archived).await?;
        }
        self.persist(&activation.activated).await?;
        *registry = next;

        AuditEvent::new("template.activate", "template", id.to_string(), actor)
            .with_details(serde_json::json!({
                "archived_id": activation.archived.as_ref().map(|t| t.id),
            }))
            .emit();
        Ok(activation)
    }

    /// Write every template back to the store.
    pub async fn flush(&self) -> Result<(), IntakeError> {
        let registry = self.registry.read().await;
        for template in registry.list(&TemplateFilter::default()) {
            self.persist(template).await?;
        }
        Ok(())
    }

    async fn persist(&self, template: &FormTemplate) -> Result<(), IntakeError> {
        state::save_state(&self.store, &keys::template(template.id), template).await?;
        Ok(())
    }
}
