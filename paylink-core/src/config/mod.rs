//! Configuration types for paylink.
//!
//! These types represent the validated runtime configuration used by the server
//! and can be shared across crates. The actual config loading/parsing is handled
//! by the server crate.

mod gateway;
mod server;
mod site;

pub use gateway::GatewayConfig;
pub use server::ServerConfig;
pub use site::SiteConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
///
/// This allows independent access to different configuration sections
/// without blocking other readers/writers.
#[derive(Clone)]
pub struct SharedConfig {
    /// Server configuration (listen address, public URL).
    pub server: Arc<RwLock<ServerConfig>>,
    /// Payment gateway endpoint and shared secret.
    pub gateway: Arc<RwLock<GatewayConfig>>,
    /// Landing pages for the return redirect.
    pub site: Arc<RwLock<SiteConfig>>,
}

impl SharedConfig {
    /// Create a new SharedConfig from individual configuration parts.
    pub fn new(server: ServerConfig, gateway: GatewayConfig, site: SiteConfig) -> Self {
        Self {
            server: Arc::new(RwLock::new(server)),
            gateway: Arc::new(RwLock::new(gateway)),
            site: Arc::new(RwLock::new(site)),
        }
    }

    /// Update all configuration sections at once.
    pub async fn update_all(&self, server: ServerConfig, gateway: GatewayConfig, site: SiteConfig) {
        // Update in sequence to avoid potential deadlocks
        *self.server.write().await = server;
        *self.gateway.write().await = gateway;
        *self.site.write().await = site;
    }
}
