use acutis_core::models::session::IntakeSession;
use acutis_core::models::template::FormTemplate;

/// Receives a session's answers once it completes.
///
/// Called after the completed session is persisted, with the expanded
/// template it was filled against. Implementations must not block.
pub trait CompletionSink: Send + Sync {
    fn session_completed(&self, session: &IntakeSession, template: &FormTemplate);
}

/// Logs completions and does nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl CompletionSink for LogSink {
    fn session_completed(&self, session: &IntakeSession, template: &FormTemplate) {
        tracing::info!(
            session_id = %session.id,
            template_id = %template.id,
            admission_id = session.admission_id.as_deref().unwrap_or(""),
            "intake session completed"
        );
    }
}
