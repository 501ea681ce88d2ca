use crate::observability::EngineMetrics;
use crate::services::chat::ChatService;
use crate::storage::store::PredicateStore;
use std::sync::Arc;

/// Application state containing all shared services
#[derive(Clone)]
pub struct AppState {
    /// Response pipeline (match + evaluate + history upkeep)
    pub chat: Arc<ChatService>,
    /// Predicate backend, exposed for the auth pass-through endpoints
    pub store: Arc<dyn PredicateStore>,
    /// Engine metrics
    pub metrics: Arc<EngineMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("chat", &"Arc<ChatService>")
            .field("store", &"Arc<dyn PredicateStore>")
            .field("metrics", &"Arc<EngineMetrics>")
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(
        chat: Arc<ChatService>,
        store: Arc<dyn PredicateStore>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            chat,
            store,
            metrics,
        }
    }
}
