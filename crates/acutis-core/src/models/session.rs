use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::answers::Answers;

/// One in-progress or completed walk through a form template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct IntakeSession {
    pub id: Uuid,
    pub template_id: Uuid,
    /// External admission record this intake belongs to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_id: Option<String>,
    /// 0-based index into the template's ordered steps.
    pub current_step_index: usize,
    #[ts(type = "Record<string, unknown>")]
    #[serde(default)]
    pub answers: Answers,
    pub started_at: jiff::Timestamp,
    pub last_updated_at: jiff::Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<jiff::Timestamp>,
}

/// Where a session sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export)]
pub enum SessionState {
    InProgress { step_index: usize },
    Completed,
}

impl IntakeSession {
    pub fn new(template_id: Uuid, admission_id: Option<String>, now: jiff::Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            template_id,
            admission_id,
            current_step_index: 0,
            answers: Answers::new(),
            started_at: now,
            last_updated_at: now,
            completed_at: None,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.completed_at.is_some() {
            SessionState::Completed
        } else {
            SessionState::InProgress {
                step_index: self.current_step_index,
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Progress update sent by a client between steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionPatch {
    #[serde(default)]
    pub current_step: Option<usize>,
    #[ts(type = "Record<string, unknown>")]
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}
