//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Reject dev origins that cannot form a header value
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderValue;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("plugin url must not be empty")]
    EmptyPluginUrl,

    #[error("dev host must be a non-empty name without whitespace: {0:?}")]
    InvalidDevHost(String),

    #[error("dev ports must not be empty")]
    NoDevPorts,

    #[error("dev port 0 is not a valid port")]
    ZeroPort,

    #[error("duplicate dev port: {0}")]
    DuplicatePort(u16),

    #[error("content security policy is not a valid header value")]
    InvalidPolicy,
}

/// Check `config` for semantic errors, collecting every one found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.server.bind_address.clone()));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.site.plugin_url.trim().is_empty() {
        errors.push(ValidationError::EmptyPluginUrl);
    }

    let host = &config.dev.host;
    if host.is_empty() || !host.chars().all(|c| c.is_ascii_graphic() && c != ';') {
        errors.push(ValidationError::InvalidDevHost(host.clone()));
    }
    if config.dev.ports.is_empty() {
        errors.push(ValidationError::NoDevPorts);
    }
    let mut seen = HashSet::new();
    for &port in &config.dev.ports {
        if port == 0 {
            errors.push(ValidationError::ZeroPort);
        } else if !seen.insert(port) {
            errors.push(ValidationError::DuplicatePort(port));
        }
    }

    if let Some(policy) = &config.headers.content_security_policy {
        if HeaderValue::from_str(policy).is_err() {
            errors.push(ValidationError::InvalidPolicy);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
