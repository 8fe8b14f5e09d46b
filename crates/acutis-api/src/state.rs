use std::sync::Arc;

use acutis_intake::IntakeService;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<IntakeService>,
}
