use std::collections::{BTreeMap, HashSet};

use jiff::Timestamp;
use uuid::Uuid;

use acutis_core::error::FormError;
use acutis_core::models::template::{
    ElementEntry, FormTemplate, INITIAL_VERSION, NewTemplate, TemplateFilter, TemplatePatch,
    TemplateStatus,
};

/// Result of activating a template.
#[derive(Debug, Clone)]
pub struct Activation {
    pub activated: FormTemplate,
    /// The template that held the active slot before, now archived.
    pub archived: Option<FormTemplate>,
}

/// In-memory set of form templates.
///
/// Holds the invariant that at most one template is `active` per
/// (unit, form type) slot: `create` and `update` reject a second active
/// template, `activate` swaps the slot over in one step.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<Uuid, FormTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from persisted templates. A slot with more than one
    /// active template keeps the most recently updated one active in memory
    /// and logs the others.
    pub fn from_templates(templates: impl IntoIterator<Item = FormTemplate>) -> Self {
        let mut registry = Self::new();
        let mut loaded: Vec<FormTemplate> = templates.into_iter().collect();
        loaded.sort_by_key(|t| std::cmp::Reverse(t.updated_at));

        for mut template in loaded {
            if template.status == TemplateStatus::Active
                && let Some(holder) = registry.active_in_slot(&template, None)
            {
                tracing::warn!(
                    template_id = %template.id,
                    active_id = %holder.id,
                    unit = %template.unit,
                    "second active template in slot, treating as archived"
                );
                template.status = TemplateStatus::Archived;
            }
            registry.templates.insert(template.id, template);
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&FormTemplate> {
        self.templates.get(&id)
    }

    /// The active template for a unit, optionally narrowed to a form type.
    pub fn get_by_unit(&self, unit: &str, form_type: Option<&str>) -> Option<&FormTemplate> {
        self.sorted()
            .into_iter()
            .find(|t| {
                t.status == TemplateStatus::Active
                    && t.unit == unit
                    && form_type.is_none_or(|ft| ft == t.form_type)
            })
    }

    /// Templates matching `filter`, oldest first.
    pub fn list(&self, filter: &TemplateFilter) -> Vec<&FormTemplate> {
        self.sorted()
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect()
    }

    fn sorted(&self) -> Vec<&FormTemplate> {
        let mut all: Vec<&FormTemplate> = self.templates.values().collect();
        all.sort_by_key(|t| (t.created_at, t.id));
        all
    }

    fn active_in_slot(&self, template: &FormTemplate, except: Option<Uuid>) -> Option<&FormTemplate> {
        self.templates.values().find(|t| {
            t.status == TemplateStatus::Active
                && t.same_slot(template)
                && Some(t.id) != except
                && t.id != template.id
        })
    }

    fn ensure_slot_free(&self, template: &FormTemplate) -> Result<(), FormError> {
        if template.status != TemplateStatus::Active {
            return Ok(());
        }
        match self.active_in_slot(template, None) {
            Some(holder) => Err(FormError::Conflict(format!(
                "template {} is already active for unit '{}' ({})",
                holder.id, template.unit, template.form_type
            ))),
            None => Ok(()),
        }
    }

    pub fn create(&mut self, new: NewTemplate, now: Timestamp) -> Result<FormTemplate, FormError> {
        let template = FormTemplate {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            unit: new.unit,
            form_type: new.form_type,
            version: new.version,
            status: new.status,
            steps: new.steps,
            created_at: now,
            updated_at: now,
        };
        check_structure(&template)?;
        self.ensure_slot_free(&template)?;
        self.templates.insert(template.id, template.clone());
        Ok(template)
    }

    pub fn update(
        &mut self,
        id: Uuid,
        patch: TemplatePatch,
        now: Timestamp,
    ) -> Result<FormTemplate, FormError> {
        let mut template = self
            .get(id)
            .cloned()
            .ok_or_else(|| FormError::not_found("template", id))?;

        if let Some(name) = patch.name {
            template.name = name;
        }
        if let Some(description) = patch.description {
            template.description = description;
        }
        if let Some(unit) = patch.unit {
            template.unit = unit;
        }
        if let Some(form_type) = patch.form_type {
            template.form_type = form_type;
        }
        if let Some(version) = patch.version {
            template.version = version;
        }
        if let Some(status) = patch.status {
            template.status = status;
        }
        if let Some(steps) = patch.steps {
            template.steps = steps;
        }
        template.updated_at = now;

        check_structure(&template)?;
        self.ensure_slot_free(&template)?;
        self.templates.insert(id, template.clone());
        Ok(template)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<FormTemplate, FormError> {
        self.templates
            .remove(&id)
            .ok_or_else(|| FormError::not_found("template", id))
    }

    /// Copy a template's steps under a new name as a fresh draft.
    pub fn duplicate(
        &mut self,
        id: Uuid,
        new_name: &str,
        now: Timestamp,
    ) -> Result<FormTemplate, FormError> {
        let source = self
            .get(id)
            .ok_or_else(|| FormError::not_found("template", id))?;
        let copy = NewTemplate {
            name: new_name.to_string(),
            description: source.description.clone(),
            unit: source.unit.clone(),
            form_type: source.form_type.clone(),
            version: INITIAL_VERSION.to_string(),
            status: TemplateStatus::Draft,
            steps: source.steps.clone(),
        };
        self.create(copy, now)
    }

    /// Make `id` the active template of its slot, archiving the previous one.
    pub fn activate(&mut self, id: Uuid, now: Timestamp) -> Result<Activation, FormError> {
        let target = self
            .get(id)
            .ok_or_else(|| FormError::not_found("template", id))?;
        if target.status == TemplateStatus::Active {
            return Ok(Activation {
                activated: target.clone(),
                archived: None,
            });
        }

        let previous_id = self.active_in_slot(target, Some(id)).map(|t| t.id);
        let archived = match previous_id.and_then(|pid| self.templates.get_mut(&pid)) {
            Some(previous) => {
                previous.status = TemplateStatus::Archived;
                previous.updated_at = now;
                Some(previous.clone())
            }
            None => None,
        };

        let activated = self
            .templates
            .get_mut(&id)
            .ok_or_else(|| FormError::not_found("template", id))?;
        activated.status = TemplateStatus::Active;
        activated.updated_at = now;

        Ok(Activation {
            activated: activated.clone(),
            archived,
        })
    }

    /// Insert or replace a template as-is. Used when reloading from storage.
    pub fn insert(&mut self, template: FormTemplate) {
        self.templates.insert(template.id, template);
    }
}

/// Structural checks on a template definition.
fn check_structure(template: &FormTemplate) -> Result<(), FormError> {
    let mut errors = Vec::new();

    if template.name.trim().is_empty() {
        errors.push("template must have a name".to_string());
    }
    if template.unit.trim().is_empty() {
        errors.push("template must have a unit".to_string());
    }
    if template.version.trim().is_empty() {
        errors.push("template must have a version".to_string());
    }

    let mut step_ids = HashSet::new();
    for step in &template.steps {
        if !step_ids.insert(step.id.as_str()) {
            errors.push(format!("duplicate step id: {}", step.id));
        }

        let mut field_ids = HashSet::new();
        let inline = step.sections.iter().flat_map(|section| {
            let entries = section.elements.iter().flatten().filter_map(|e| match e {
                ElementEntry::Inline(field) => Some(field),
                ElementEntry::Reference(_) => None,
            });
            section.fields.iter().chain(entries)
        });
        for field in inline {
            if !field_ids.insert(field.id.as_str()) {
                errors.push(format!("duplicate field id '{}' in step {}", field.id, step.id));
            }
            if field.field_type.requires_options()
                && field.options.as_ref().is_none_or(|o| o.is_empty())
            {
                errors.push(format!("field '{}' needs at least one option", field.id));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(FormError::Validation(errors))
    }
}
