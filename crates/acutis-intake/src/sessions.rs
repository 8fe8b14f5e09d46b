use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use jiff::Timestamp;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use acutis_audit::AuditEvent;
use acutis_core::error::FormError;
use acutis_core::keys;
use acutis_core::models::field::FieldValue;
use acutis_core::models::session::{IntakeSession, SessionPatch};
use acutis_core::models::template::FormTemplate;
use acutis_forms::progress;
use acutis_storage::{ObjectStore, state};

use crate::error::{IntakeError, session_write_error};
use crate::library::LibraryStore;
use crate::sink::CompletionSink;
use crate::templates::TemplateStore;

/// Tracks intake sessions.
///
/// The store is the source of truth: every operation reloads the session,
/// applies the change and writes it back conditioned on the ETag it read.
/// Writers in this process are serialized per session; a writer elsewhere
/// surfaces as `Conflict`.
pub struct SessionTracker {
    store: ObjectStore,
    templates: Arc<TemplateStore>,
    library: Arc<LibraryStore>,
    sink: Arc<dyn CompletionSink>,
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
    start_lock: Mutex<()>,
}

impl SessionTracker {
    pub fn new(
        store: ObjectStore,
        templates: Arc<TemplateStore>,
        library: Arc<LibraryStore>,
        sink: Arc<dyn CompletionSink>,
    ) -> Self {
        Self {
            store,
            templates,
            library,
            sink,
            locks: Mutex::new(HashMap::new()),
            start_lock: Mutex::new(()),
        }
    }

    /// Begin an intake against a template.
    ///
    /// With an `admission_id`, an open session for the same admission and
    /// template is returned instead of starting a second one.
    pub async fn start_session(
        &self,
        template_id: Uuid,
        admission_id: Option<String>,
        actor: &str,
    ) -> Result<IntakeSession, IntakeError> {
        if self.templates.get_template_by_id(template_id).await.is_none() {
            return Err(FormError::not_found("template", template_id).into());
        }

        let _guard = self.start_lock.lock().await;
        if let Some(admission) = admission_id.as_deref()
            && let Some(open) = self.find_open(template_id, admission).await?
        {
            tracing::info!(
                session_id = %open.id,
                admission_id = admission,
                "resuming open session for admission"
            );
            return Ok(open);
        }

        let session = IntakeSession::new(template_id, admission_id, Timestamp::now());
        state::save_state(&self.store, &keys::session(session.id), &session).await?;

        AuditEvent::new("session.start", "session", session.id.to_string(), actor)
            .with_details(serde_json::json!({
                "template_id": template_id,
                "admission_id": session.admission_id,
            }))
            .emit();
        Ok(session)
    }

    async fn find_open(
        &self,
        template_id: Uuid,
        admission_id: &str,
    ) -> Result<Option<IntakeSession>, IntakeError> {
        let sessions: Vec<(IntakeSession, String)> =
            state::load_all(&self.store, keys::SESSIONS_PREFIX).await?;
        Ok(sessions
            .into_iter()
            .map(|(session, _)| session)
            .filter(|s| {
                !s.is_completed()
                    && s.template_id == template_id
                    && s.admission_id.as_deref() == Some(admission_id)
            })
            .max_by_key(|s| s.last_updated_at))
    }

    pub async fn get_session(&self, id: Uuid) -> Result<Option<IntakeSession>, IntakeError> {
        let loaded = state::load_state_opt(&self.store, &keys::session(id)).await?;
        Ok(loaded.map(|(session, _etag)| session))
    }

    /// The persisted session, as stored. Nothing is revalidated.
    pub async fn resume(&self, id: Uuid) -> Result<IntakeSession, IntakeError> {
        let (session, _etag) = self.load(id).await?;
        if self
            .templates
            .get_template_by_id(session.template_id)
            .await
            .is_none()
        {
            tracing::warn!(
                session_id = %id,
                template_id = %session.template_id,
                "resumed session refers to a missing template"
            );
        }
        Ok(session)
    }

    /// Every validation error on the session's current step.
    pub async fn step_errors(&self, id: Uuid) -> Result<BTreeMap<String, String>, IntakeError> {
        let (session, _etag) = self.load(id).await?;
        let template = self.expanded_template(&session).await?;
        Ok(progress::step_errors(&session, &template, Timestamp::now()))
    }

    pub async fn can_advance(&self, id: Uuid) -> Result<bool, IntakeError> {
        let (session, _etag) = self.load(id).await?;
        let template = self.expanded_template(&session).await?;
        Ok(progress::can_advance(&session, &template, Timestamp::now()))
    }

    pub async fn set_field(
        &self,
        id: Uuid,
        field_id: &str,
        value: FieldValue,
        actor: &str,
    ) -> Result<IntakeSession, IntakeError> {
        self.mutate(id, "session.set_field", actor, |session, _, now| {
            progress::set_field(session, field_id, value, now)
        })
        .await
    }

    /// Merge `data` into the answers and move to `current_step` when given.
    pub async fn patch_session(
        &self,
        id: Uuid,
        patch: SessionPatch,
        actor: &str,
    ) -> Result<IntakeSession, IntakeError> {
        self.mutate(id, "session.patch", actor, |session, template, now| {
            if session.is_completed() {
                return Err(FormError::InvalidTransition(format!(
                    "session {} is already completed",
                    session.id
                )));
            }
            session.answers.merge_json(patch.data)?;
            match patch.current_step {
                Some(index) => progress::go_to_step(session, template, index, now),
                None => {
                    session.last_updated_at = now;
                    Ok(())
                }
            }
        })
        .await
    }

    pub async fn advance(&self, id: Uuid, actor: &str) -> Result<IntakeSession, IntakeError> {
        self.mutate(id, "session.advance", actor, |session, template, now| {
            progress::advance(session, template, now).map(|_| ())
        })
        .await
    }

    pub async fn retreat(&self, id: Uuid, actor: &str) -> Result<IntakeSession, IntakeError> {
        self.mutate(id, "session.retreat", actor, |session, _, now| {
            progress::retreat(session, now).map(|_| ())
        })
        .await
    }

    /// Validate the final step and mark the session completed.
    pub async fn complete_session(
        &self,
        id: Uuid,
        actor: &str,
    ) -> Result<IntakeSession, IntakeError> {
        self.mutate(id, "session.complete", actor, |session, template, now| {
            progress::complete(session, template, now)
        })
        .await
    }

    async fn load(&self, id: Uuid) -> Result<(IntakeSession, String), IntakeError> {
        state::load_state_opt(&self.store, &keys::session(id))
            .await?
            .ok_or_else(|| FormError::not_found("session", id).into())
    }

    async fn expanded_template(&self, session: &IntakeSession) -> Result<FormTemplate, IntakeError> {
        let template = self
            .templates
            .get_template_by_id(session.template_id)
            .await
            .ok_or_else(|| FormError::not_found("template", session.template_id))?;
        Ok(self.library.expand(&template).await)
    }

    async fn lock(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock().await;
            locks.entry(id).or_default().clone()
        };
        entry.lock_owned().await
    }

    /// Drop the lock entry for `id` once no writer holds or waits on it.
    /// Waiters clone the entry under the map lock, so the count is exact.
    async fn release(&self, id: Uuid) {
        let mut locks = self.locks.lock().await;
        if locks
            .get(&id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&id);
        }
    }

    /// Load, change and conditionally save one session.
    async fn mutate<F>(
        &self,
        id: Uuid,
        action: &str,
        actor: &str,
        change: F,
    ) -> Result<IntakeSession, IntakeError>
    where
        F: FnOnce(&mut IntakeSession, &FormTemplate, Timestamp) -> Result<(), FormError>,
    {
        let guard = self.lock(id).await;
        let result = self.mutate_locked(id, action, actor, change).await;
        drop(guard);
        self.release(id).await;
        result
    }

    async fn mutate_locked<F>(
        &self,
        id: Uuid,
        action: &str,
        actor: &str,
        change: F,
    ) -> Result<IntakeSession, IntakeError>
    where
        F: FnOnce(&mut IntakeSession, &FormTemplate, Timestamp) -> Result<(), FormError>,
    {
        let (mut session, etag) = self.load(id).await?;
        let template = self.expanded_template(&session).await?;
        let was_completed = session.is_completed();

        change(&mut session, &template, Timestamp::now())?;

        state::save_state_if_match(&self.store, &keys::session(id), &session, &etag)
            .await
            .map_err(|e| session_write_error(id, e))?;

        AuditEvent::new(action, "session", id.to_string(), actor)
            .with_details(serde_json::json!({
                "step_index": session.current_step_index,
                "completed": session.is_completed(),
            }))
            .emit();

        if !was_completed && session.is_completed() {
            self.sink.session_completed(&session, &template);
        }
        Ok(session)
    }
}
