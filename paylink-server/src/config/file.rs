//! TOML file configuration structures.
//!
//! These structs directly map to the `paylink-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub site: SiteConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
    /// Public base URL of this service, as the gateway and browsers see it.
    pub public_url: Url,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Payment gateway section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Payment form URL (e.g., "https://shop.payform.ru/").
    pub base_url: Url,
    /// Shared HMAC secret. May be left out and supplied through
    /// `--gateway-secret` / `PAYLINK_GATEWAY_SECRET` instead.
    #[serde(default)]
    pub secret: Option<String>,
    /// Integration identifier sent as `sys`.
    #[serde(default)]
    pub sys: Option<String>,
}

/// Landing pages after the gateway redirects the buyer back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub success_page: Url,
    pub failure_page: Url,
}
