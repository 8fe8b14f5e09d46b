//! acutis-audit
//!
//! Application-level audit trail for intake activity, emitted through `tracing`.

pub mod events;

pub use events::AuditEvent;
