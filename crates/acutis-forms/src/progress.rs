//! Step progression for an intake session.
//!
//! A session is `InProgress(step)` until it advances past its last step,
//! then `Completed`. All functions here expect an expanded template; fields
//! still hidden behind element references are not seen.

use std::collections::BTreeMap;

use jiff::Timestamp;
use jiff::tz::TimeZone;

use acutis_core::error::FormError;
use acutis_core::models::answers::Answers;
use acutis_core::models::field::{FieldDefinition, FieldValue};
use acutis_core::models::session::{IntakeSession, SessionState};
use acutis_core::models::template::{FormStep, FormTemplate};

use crate::validate::validate_field_on;

/// The step the session is currently on, in walk order.
pub fn current_step<'t>(session: &IntakeSession, template: &'t FormTemplate) -> Option<&'t FormStep> {
    template
        .ordered_steps()
        .get(session.current_step_index)
        .copied()
}

/// A field gated by `dependsOn` is only active while its controlling answer
/// is truthy.
pub fn is_field_active(field: &FieldDefinition, answers: &Answers) -> bool {
    match &field.depends_on {
        Some(controller) => answers.get(controller).is_some_and(FieldValue::is_truthy),
        None => true,
    }
}

/// Every validation error on the current step, keyed by field id. Inactive
/// fields are skipped.
pub fn step_errors(
    session: &IntakeSession,
    template: &FormTemplate,
    now: Timestamp,
) -> BTreeMap<String, String> {
    match current_step(session, template) {
        Some(step) => errors_on(step, &session.answers, now),
        None => BTreeMap::new(),
    }
}

fn errors_on(step: &FormStep, answers: &Answers, now: Timestamp) -> BTreeMap<String, String> {
    let today = now.to_zoned(TimeZone::UTC).date();
    step.fields()
        .filter(|field| is_field_active(field, answers))
        .filter_map(|field| {
            validate_field_on(field, answers.get(&field.id), today)
                .map(|message| (field.id.clone(), message))
        })
        .collect()
}

pub fn can_advance(session: &IntakeSession, template: &FormTemplate, now: Timestamp) -> bool {
    !session.is_completed() && step_errors(session, template, now).is_empty()
}

fn ensure_in_progress(session: &IntakeSession) -> Result<(), FormError> {
    if session.is_completed() {
        return Err(FormError::InvalidTransition(format!(
            "session {} is already completed",
            session.id
        )));
    }
    Ok(())
}

/// Record an answer.
pub fn set_field(
    session: &mut IntakeSession,
    field_id: &str,
    value: FieldValue,
    now: Timestamp,
) -> Result<(), FormError> {
    ensure_in_progress(session)?;
    if field_id.is_empty() {
        return Err(FormError::validation("field id must not be empty"));
    }
    session.answers.set(field_id, value);
    session.last_updated_at = now;
    Ok(())
}

/// Move past the current step once it validates. Advancing from the last
/// step completes the session and leaves the index on that step.
pub fn advance(
    session: &mut IntakeSession,
    template: &FormTemplate,
    now: Timestamp,
) -> Result<SessionState, FormError> {
    ensure_in_progress(session)?;

    let errors = step_errors(session, template, now);
    if !errors.is_empty() {
        return Err(FormError::InvalidTransition(format!(
            "step {} has {} invalid field(s): {}",
            session.current_step_index,
            errors.len(),
            errors.keys().cloned().collect::<Vec<_>>().join(", ")
        )));
    }

    let next = session.current_step_index + 1;
    if next >= template.step_count() {
        session.current_step_index = template.step_count().saturating_sub(1);
        session.completed_at = Some(now);
    } else {
        session.current_step_index = next;
    }
    session.last_updated_at = now;
    Ok(session.state())
}

/// Step back one step. A no-op on the first step.
pub fn retreat(session: &mut IntakeSession, now: Timestamp) -> Result<SessionState, FormError> {
    ensure_in_progress(session)?;
    if session.current_step_index > 0 {
        session.current_step_index -= 1;
        session.last_updated_at = now;
    }
    Ok(session.state())
}

/// Jump to a step index.
///
/// Moving back is always allowed. Moving forward passes through every step
/// from the current one up to `index`, and each of them must validate.
pub fn go_to_step(
    session: &mut IntakeSession,
    template: &FormTemplate,
    index: usize,
    now: Timestamp,
) -> Result<(), FormError> {
    ensure_in_progress(session)?;
    if index >= template.step_count() {
        return Err(FormError::validation(format!(
            "step index {index} is out of range for a template with {} step(s)",
            template.step_count()
        )));
    }

    let steps = template.ordered_steps();
    for skipped in session.current_step_index..index {
        let errors = errors_on(steps[skipped], &session.answers, now);
        if !errors.is_empty() {
            return Err(FormError::InvalidTransition(format!(
                "cannot move to step {index}: step {skipped} has {} invalid field(s): {}",
                errors.len(),
                errors.keys().cloned().collect::<Vec<_>>().join(", ")
            )));
        }
    }

    session.current_step_index = index;
    session.last_updated_at = now;
    Ok(())
}

/// Complete a session sitting on its final step.
pub fn complete(
    session: &mut IntakeSession,
    template: &FormTemplate,
    now: Timestamp,
) -> Result<(), FormError> {
    ensure_in_progress(session)?;
    if session.current_step_index + 1 < template.step_count() {
        return Err(FormError::InvalidTransition(format!(
            "session {} is on step {} of {}; only the final step can complete",
            session.id,
            session.current_step_index + 1,
            template.step_count()
        )));
    }
    match advance(session, template, now)? {
        SessionState::Completed => Ok(()),
        SessionState::InProgress { .. } => Err(FormError::InvalidTransition(format!(
            "session {} did not complete",
            session.id
        ))),
    }
}
