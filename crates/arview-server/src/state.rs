//! Application state management

use arview_core::CatalogInfo;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;

/// Shared application state
pub struct AppState {
    /// Configuration
    pub config: Config,
    /// Catalog as served to the frontend
    pub catalog: CatalogInfo,
    pub started: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Arc<Self> {
        let catalog = CatalogInfo::from(&config.viewer);
        Arc::new(Self {
            config,
            catalog,
            started: Instant::now(),
        })
    }
}
