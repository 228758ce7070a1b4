use std::sync::Arc;

use crate::settings::Settings;
use crate::store::MemoryStore;

/// Application state structure for the web server
#[derive(Debug)]
pub struct AppState {
    /// Settings snapshot taken at start-up
    pub config: Arc<Settings>,

    /// Source and group storage
    pub store: Arc<MemoryStore>,
}

impl AppState {
    /// Create a new AppState instance
    pub fn new(config: Arc<Settings>, store: Arc<MemoryStore>) -> Self {
        Self { config, store }
    }

    /// Build the state from settings, loading the store snapshot when one is configured.
    pub fn from_settings(config: Arc<Settings>) -> Result<Self, crate::store::StoreError> {
        let store = if config.store_path.trim().is_empty() {
            MemoryStore::new()
        } else {
            MemoryStore::load_from_file(&config.store_path)?
        };
        Ok(Self::new(config, Arc::new(store)))
    }
}
