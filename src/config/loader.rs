//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::site::environment::{Environment, ENVIRONMENT_VAR};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// `WP_ENVIRONMENT_TYPE`, when set, overrides `site.environment`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, std::env::var(ENVIRONMENT_VAR).ok().as_deref())
}

/// Parse and validate configuration text with an optional environment override.
pub fn parse_config(content: &str, environment: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut config: AppConfig = toml::from_str(content)?;

    if let Some(tag) = environment {
        config.site.environment = Environment::from_tag(tag);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Configuration from `path` if given, defaults otherwise.
pub fn load_or_default(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => parse_config("", std::env::var(ENVIRONMENT_VAR).ok().as_deref()),
    }
}
