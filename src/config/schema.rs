//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the asset server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::security::csp::{DEFAULT_DEV_HOST, DEFAULT_DEV_PORTS};
use crate::security::filters::CONNECT_SRC_PRIORITY;
use crate::site::{BuildPaths, Environment};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Dev server settings.
    pub server: ServerConfig,

    /// Host site settings (environment, plugin location).
    pub site: SiteConfig,

    /// Response header policy.
    pub headers: HeadersConfig,

    /// Local development origins allowed in `connect-src`.
    pub dev: DevConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    pub fn build_paths(&self) -> BuildPaths {
        BuildPaths::new(self.site.plugin_path.clone(), self.site.plugin_url.clone())
    }
}

/// Dev server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8887").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8887".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Host site configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    /// Environment classification (local, development, staging, production).
    pub environment: Environment,

    /// Plugin root on disk; `build/` lives underneath.
    pub plugin_path: PathBuf,

    /// Public URL of the plugin root.
    pub plugin_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            plugin_path: PathBuf::from("."),
            plugin_url: "http://localhost:8887/".to_string(),
        }
    }
}

/// Response header configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HeadersConfig {
    /// Policy applied to responses that carry none.
    pub content_security_policy: Option<String>,

    /// Filter priority of the connect-src patch.
    pub connect_src_priority: i32,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            content_security_policy: None,
            connect_src_priority: CONNECT_SRC_PRIORITY,
        }
    }
}

/// Local development origins.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DevConfig {
    pub host: String,
    pub ports: Vec<u16>,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DEV_HOST.to_string(),
            ports: DEFAULT_DEV_PORTS.to_vec(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
