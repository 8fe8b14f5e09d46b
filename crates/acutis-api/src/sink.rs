use acutis_audit::{AuditEvent, events::SYSTEM_USER};
use acutis_core::models::session::IntakeSession;
use acutis_core::models::template::FormTemplate;
use acutis_intake::CompletionSink;

/// Hands completed intakes to the admissions side as an audit event.
///
/// Answers are not logged; the receiver reads the session by id.
pub struct AdmissionAuditSink;

impl CompletionSink for AdmissionAuditSink {
    fn session_completed(&self, session: &IntakeSession, template: &FormTemplate) {
        AuditEvent::new(
            "admission_completed",
            "session",
            session.id.to_string(),
            SYSTEM_USER,
        )
        .with_details(serde_json::json!({
            "template_id": template.id,
            "template_version": template.version,
            "unit": template.unit,
            "admission_id": session.admission_id,
            "completed_at": session.completed_at,
        }))
        .emit();
    }
}
