//! Runtime configuration re-exports.
//!
//! The actual config types are defined in `paylink-core::config`.
//! This module re-exports them for convenience.

pub use paylink_core::config::{GatewayConfig, ServerConfig, SharedConfig, SiteConfig};
