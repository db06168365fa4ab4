//! Application state shared across all request handlers.

use crate::config::runtime::SharedConfig;
use paylink_core::store::OrderStore;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Order storage.
    pub store: Arc<dyn OrderStore>,
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
}

impl AppState {
    /// Create a new AppState with the given order store and configuration.
    pub fn new(store: Arc<dyn OrderStore>, config: SharedConfig) -> Self {
        Self { store, config }
    }
}
