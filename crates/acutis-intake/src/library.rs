use tokio::sync::RwLock;

use acutis_audit::AuditEvent;
use acutis_core::keys;
use acutis_core::models::element::{ElementCategory, FormElement, LibrarySnapshot, NewElement};
use acutis_core::models::field::FieldDefinition;
use acutis_core::models::template::FormTemplate;
use acutis_forms::library::LibraryStatistics;
use acutis_forms::{ElementLibrary, Expander};
use acutis_storage::{ObjectStore, state};

use crate::error::IntakeError;

/// The element library, shared by every session and template.
///
/// Reads run concurrently; adding or removing a custom element takes the
/// write lock and persists the snapshot before the change becomes visible.
pub struct LibraryStore {
    store: ObjectStore,
    library: RwLock<ElementLibrary>,
}

impl LibraryStore {
    /// Load the persisted library snapshot. When none exists, start from the
    /// built-in catalog (or empty when `seed_catalog` is off) and persist it.
    pub async fn load(store: ObjectStore, seed_catalog: bool) -> Result<Self, IntakeError> {
        let library = match state::load_state_opt::<LibrarySnapshot>(&store, keys::LIBRARY).await? {
            Some((snapshot, _etag)) => {
                tracing::info!(
                    categories = snapshot.categories.len(),
                    custom = snapshot.custom_elements.len(),
                    "element library loaded"
                );
                ElementLibrary::new(snapshot)
            }
            None => {
                let library = if seed_catalog {
                    ElementLibrary::seeded()
                } else {
                    ElementLibrary::default()
                };
                state::save_state(&store, keys::LIBRARY, library.snapshot()).await?;
                tracing::info!(seeded = seed_catalog, "element library initialized");
                library
            }
        };

        Ok(Self {
            store,
            library: RwLock::new(library),
        })
    }

    pub async fn snapshot(&self) -> LibrarySnapshot {
        self.library.read().await.snapshot().clone()
    }

    pub async fn categories(&self) -> Vec<ElementCategory> {
        self.library.read().await.categories().to_vec()
    }

    pub async fn category(&self, category_id: &str) -> Option<ElementCategory> {
        self.library.read().await.category(category_id).cloned()
    }

    pub async fn get_element(&self, element_id: &str) -> Option<FormElement> {
        self.library.read().await.get_element(element_id).cloned()
    }

    pub async fn get_elements(&self, element_ids: &[String]) -> Vec<FormElement> {
        let library = self.library.read().await;
        library
            .get_elements(element_ids)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn expand_element_ids(&self, element_ids: &[String]) -> Vec<FieldDefinition> {
        self.library.read().await.expand_element_ids(element_ids)
    }

    pub async fn search_elements(&self, query: &str) -> Vec<FormElement> {
        let library = self.library.read().await;
        library.search_elements(query).into_iter().cloned().collect()
    }

    pub async fn popular_elements(&self, limit: usize) -> Vec<FormElement> {
        let library = self.library.read().await;
        library.popular_elements(limit).into_iter().cloned().collect()
    }

    pub async fn statistics(&self) -> LibraryStatistics {
        self.library.read().await.statistics()
    }

    pub async fn clone_element(&self, element_id: &str, new_name: &str) -> Option<FormElement> {
        self.library.read().await.clone_element(element_id, new_name)
    }

    /// Expand a template against the current library.
    pub async fn expand(&self, template: &FormTemplate) -> FormTemplate {
        let library = self.library.read().await;
        Expander::new(&library).expand(template)
    }

    pub async fn add_custom_element(
        &self,
        new: NewElement,
        actor: &str,
    ) -> Result<FormElement, IntakeError> {
        let mut library = self.library.write().await;
        let mut next = library.clone();
        let element = next.add_custom_element(new)?;

        state::save_state(&self.store, keys::LIBRARY, next.snapshot()).await?;
        *library = next;

        AuditEvent::new("element.create", "element", &element.id, actor)
            .with_details(serde_json::json!({ "name": element.name }))
            .emit();
        Ok(element)
    }

    pub async fn remove_custom_element(
        &self,
        element_id: &str,
        actor: &str,
    ) -> Result<bool, IntakeError> {
        let mut library = self.library.write().await;
        let mut next = library.clone();
        if !next.remove_custom_element(element_id) {
            return Ok(false);
        }

        state::save_state(&self.store, keys::LIBRARY, next.snapshot()).await?;
        *library = next;

        AuditEvent::new("element.delete", "element", element_id, actor).emit();
        Ok(true)
    }

    /// Write the current snapshot back to the store.
    pub async fn flush(&self) -> Result<(), IntakeError> {
        let library = self.library.read().await;
        state::save_state(&self.store, keys::LIBRARY, library.snapshot()).await?;
        Ok(())
    }
}
