//! Shared application state for axum handlers.

use std::sync::Arc;

use bizhub_app::automation_engine::AutomationEngine;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so the store types themselves do not
/// need to be `Clone`; only the `Arc` is cloned.
pub struct AppState<S, K> {
    /// The automation engine; also owns the entity store.
    pub engine: Arc<AutomationEngine<S, K>>,
}

impl<S, K> Clone for AppState<S, K> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S, K> AppState<S, K> {
    /// Wrap an engine that is already shared with background tasks.
    pub fn new(engine: Arc<AutomationEngine<S, K>>) -> Self {
        Self { engine }
    }
}
