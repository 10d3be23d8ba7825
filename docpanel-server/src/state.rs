//! Shared application state

use std::sync::Arc;

use docpanel_core::CollectionStore;

use crate::config::Config;

/// Handed to every handler. Holds only the store handle and configuration;
/// all document state lives in the store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CollectionStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn CollectionStore>, config: Config) -> Self {
        AppState {
            store,
            config: Arc::new(config),
        }
    }

    /// The requested database, or the configured default
    pub fn database(&self, requested: Option<String>) -> String {
        requested
            .filter(|db| !db.trim().is_empty())
            .unwrap_or_else(|| self.config.default_database.clone())
    }
}
