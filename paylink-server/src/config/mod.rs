//! Configuration module for paylink-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{GatewayConfig, ServerConfig, SharedConfig, SiteConfig};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("gateway secret is not configured")]
    MissingGatewaySecret,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub site: SiteConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig::new(self.server, self.gateway, self.site)
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
    secret_override: Option<String>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(
        config_path: impl AsRef<Path>,
        listen_override: Option<SocketAddr>,
        secret_override: Option<String>,
    ) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
            secret_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI / environment overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_from_str(&config_content)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn load_from_str(&self, content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }
        if let Some(secret) = &self.secret_override {
            file_config.gateway.secret = Some(secret.clone());
        }

        self.validate(&file_config)?;
        self.build_loaded_config(file_config)
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        // Refuse to run without a secret rather than accept unverified callbacks.
        match config.gateway.secret.as_deref() {
            Some(secret) if !secret.is_empty() => {}
            _ => return Err(ConfigError::MissingGatewaySecret),
        }

        if config.server.public_url.cannot_be_a_base() {
            return Err(ConfigError::ValidationError(format!(
                "public_url {} cannot be used as a base URL",
                config.server.public_url
            )));
        }
        Ok(())
    }

    fn build_loaded_config(&self, file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
        let secret = file_config
            .gateway
            .secret
            .ok_or(ConfigError::MissingGatewaySecret)?;

        Ok(LoadedConfig {
            server: ServerConfig {
                listen: file_config.server.listen,
                public_url: with_trailing_slash(file_config.server.public_url),
            },
            gateway: GatewayConfig::new(
                file_config.gateway.base_url,
                secret.into_bytes().into_boxed_slice(),
                file_config.gateway.sys,
            ),
            site: SiteConfig {
                success_page: file_config.site.success_page,
                failure_page: file_config.site.failure_page,
            },
        })
    }
}

/// `https://shop.example.com/app` -> `https://shop.example.com/app/`, so that
/// joining relative endpoint paths keeps the last segment.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
