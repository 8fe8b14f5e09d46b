use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::field::FieldDefinition;

pub const DEFAULT_FORM_TYPE: &str = "admission";

pub const INITIAL_VERSION: &str = "1.0";

fn default_form_type() -> String {
    DEFAULT_FORM_TYPE.to_string()
}

fn default_version() -> String {
    INITIAL_VERSION.to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TemplateStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

/// One entry of a section's pre-expansion element list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum ElementEntry {
    /// Id of a library element whose fields are spliced in.
    Reference(String),
    Inline(FieldDefinition),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FormSection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    /// Present only before expansion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<ElementEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FormStep {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub order: i32,
    pub sections: Vec<FormSection>,
}

impl FormStep {
    /// Sections in render order. Ties keep declaration order.
    pub fn ordered_sections(&self) -> Vec<&FormSection> {
        let mut sections: Vec<&FormSection> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.order);
        sections
    }

    /// Every field of the step, flattened in render order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.ordered_sections()
            .into_iter()
            .flat_map(|section| section.fields.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FormTemplate {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unit: String,
    #[serde(default = "default_form_type")]
    pub form_type: String,
    pub version: String,
    #[serde(default)]
    pub status: TemplateStatus,
    pub steps: Vec<FormStep>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl FormTemplate {
    /// Steps in walk order. Ties keep declaration order.
    pub fn ordered_steps(&self) -> Vec<&FormStep> {
        let mut steps: Vec<&FormStep> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.order);
        steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// True when no section still carries an element reference list.
    pub fn is_expanded(&self) -> bool {
        self.steps
            .iter()
            .flat_map(|step| &step.sections)
            .all(|section| section.elements.is_none())
    }

    /// Whether this template occupies the same active slot as `other`.
    pub fn same_slot(&self, other: &FormTemplate) -> bool {
        self.unit == other.unit && self.form_type == other.form_type
    }
}

/// Input for creating a template. Id and timestamps are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unit: String,
    #[serde(default = "default_form_type")]
    pub form_type: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub status: TemplateStatus,
    #[serde(default)]
    pub steps: Vec<FormStep>,
}

/// Partial update of a template. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TemplatePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub form_type: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<TemplateStatus>,
    #[serde(default)]
    pub steps: Option<Vec<FormStep>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TemplateFilter {
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub form_type: Option<String>,
    #[serde(default)]
    pub status: Option<TemplateStatus>,
}

impl TemplateFilter {
    pub fn matches(&self, template: &FormTemplate) -> bool {
        self.unit.as_ref().is_none_or(|u| *u == template.unit)
            && self
                .form_type
                .as_ref()
                .is_none_or(|t| *t == template.form_type)
            && self.status.is_none_or(|s| s == template.status)
    }
}
