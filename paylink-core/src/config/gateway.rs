//! Payment gateway configuration.

use url::Url;

/// Payment gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Payment form URL the buyer is redirected to.
    pub base_url: Url,
    /// Shared secret key bytes for HMAC signing.
    pub secret: Box<[u8]>,
    /// Integration identifier sent as `sys`, if the gateway assigned one.
    pub sys: Option<String>,
}

impl GatewayConfig {
    /// Create a new GatewayConfig.
    pub fn new(base_url: Url, secret: impl Into<Box<[u8]>>, sys: Option<String>) -> Self {
        Self {
            base_url,
            secret: secret.into(),
            sys,
        }
    }

    /// Get the secret key bytes for HMAC signing.
    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }

    /// Whether a usable secret is configured.
    pub fn has_secret(&self) -> bool {
        !self.secret.is_empty()
    }
}
