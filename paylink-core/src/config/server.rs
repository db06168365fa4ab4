//! Server configuration.

use std::net::SocketAddr;
use url::Url;

/// Server configuration with runtime values.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address and port to listen on.
    pub listen: SocketAddr,
    /// Externally visible base URL, used for the return and notification
    /// URLs handed to the gateway.
    pub public_url: Url,
}

impl ServerConfig {
    /// Resolve `path` against [`public_url`](Self::public_url).
    pub fn public_endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.public_url.join(path)
    }
}
