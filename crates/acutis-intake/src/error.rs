use thiserror::Error;

use acutis_core::error::{ErrorKind, FormError};
use acutis_storage::error::StorageError;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IntakeError {
    /// The contract kind, when this is an engine error rather than a
    /// storage failure.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Form(e) => Some(e.kind()),
            Self::Storage(_) => None,
        }
    }
}

/// Map a failed conditional write on a session to a conflict.
pub(crate) fn session_write_error(id: uuid::Uuid, err: StorageError) -> IntakeError {
    match err {
        StorageError::PreconditionFailed { .. } => IntakeError::Form(FormError::Conflict(format!(
            "session {id} was modified concurrently; reload and retry"
        ))),
        other => IntakeError::Storage(other),
    }
}
