use std::sync::Arc;

use centralita_core::{Broadcaster, CallStore, Classifier, Transcriber};

/// Shared application state passed to all route handlers.
///
/// The store and broadcaster are process-lifetime singletons; the external
/// collaborators come in as trait objects so tests can swap in stubs.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CallStore>,
    pub classifier: Arc<dyn Classifier>,
    pub transcriber: Arc<dyn Transcriber>,
    pub broadcaster: Broadcaster,
}

impl AppState {
    pub fn new(
        store: Arc<CallStore>,
        classifier: Arc<dyn Classifier>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            store,
            classifier,
            transcriber,
            broadcaster: Broadcaster::new(),
        }
    }
}
