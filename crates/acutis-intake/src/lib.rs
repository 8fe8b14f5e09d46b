//! acutis-intake
//!
//! Storage-backed intake service: the element library, the template store
//! and the session tracker, each loaded from and flushed to an
//! [`ObjectStore`](acutis_storage::ObjectStore).

pub mod error;
pub mod library;
pub mod service;
pub mod sessions;
pub mod sink;
pub mod templates;

pub use error::IntakeError;
pub use service::{IntakeService, ServiceOptions};
pub use sink::{CompletionSink, LogSink};
