use std::sync::Arc;

use acutis_storage::ObjectStore;

use crate::error::IntakeError;
use crate::library::LibraryStore;
use crate::sessions::SessionTracker;
use crate::sink::{CompletionSink, LogSink};
use crate::templates::TemplateStore;

pub struct ServiceOptions {
    /// Seed the built-in element catalog when no library is stored yet.
    pub seed_catalog: bool,
    pub sink: Arc<dyn CompletionSink>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            seed_catalog: true,
            sink: Arc::new(LogSink),
        }
    }
}

/// The library, template store and session tracker over one object store.
pub struct IntakeService {
    pub library: Arc<LibraryStore>,
    pub templates: Arc<TemplateStore>,
    pub sessions: SessionTracker,
}

impl IntakeService {
    pub async fn open(store: ObjectStore, options: ServiceOptions) -> Result<Self, IntakeError> {
        let library = Arc::new(LibraryStore::load(store.clone(), options.seed_catalog).await?);
        let templates = Arc::new(TemplateStore::load(store.clone()).await?);
        let sessions = SessionTracker::new(
            store,
            Arc::clone(&templates),
            Arc::clone(&library),
            options.sink,
        );

        Ok(Self {
            library,
            templates,
            sessions,
        })
    }

    /// Write in-memory library and template state back to the store.
    /// Sessions are written on every change and need no flush.
    pub async fn flush(&self) -> Result<(), IntakeError> {
        self.library.flush().await?;
        self.templates.flush().await?;
        tracing::info!("intake state flushed");
        Ok(())
    }
}
