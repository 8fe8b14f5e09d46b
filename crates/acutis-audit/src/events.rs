use serde::Serialize;
use tracing::info;

/// Principal recorded when an action is not tied to a signed-in user.
pub const SYSTEM_USER: &str = "system";

/// A structured audit event for intake actions.
///
/// Events are logged via `tracing` so they land wherever the subscriber
/// ships logs; the `audit.*` field prefix makes them easy to filter.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub user_sub: String,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        user_sub: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            user_sub: user_sub.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Emit this audit event via tracing.
    pub fn emit(&self) {
        let details = self
            .details
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();
        info!(
            audit.action = %self.action,
            audit.resource_type = %self.resource_type,
            audit.resource_id = %self.resource_id,
            audit.user_sub = %self.user_sub,
            audit.details = %details,
            "audit event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_are_optional() {
        let event = AuditEvent::new("session.start", "session", "abc", SYSTEM_USER);
        assert!(event.details.is_none());

        let event = event.with_details(serde_json::json!({ "template_id": "t1" }));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["details"]["template_id"], "t1");
        assert_eq!(json["user_sub"], "system");
    }
}
