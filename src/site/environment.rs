//! Environment classification.
//!
//! # Responsibilities
//! - Model the host's environment tags (local, development, staging, production)
//! - Parse tags the way the host does: unknown values mean production
//!
//! # Design Decisions
//! - Passed explicitly to every consumer; never read from ambient state
//!   inside the header filters

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Environment variable consulted by the config loader.
pub const ENVIRONMENT_VAR: &str = "WP_ENVIRONMENT_TYPE";

/// Deployment classification supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Development,
    Staging,
    #[default]
    Production,
}

impl Environment {
    /// Parse a host tag, falling back to `Production` for anything unrecognized.
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or_else(|_| {
            tracing::warn!(tag = %tag, "Unknown environment type, assuming production");
            Environment::Production
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Environment::Local)
    }
}

/// Returned when a tag is not one of the four known environment types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment type: {0}")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Environment::Local),
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(UnknownEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tags() {
        assert_eq!("local".parse::<Environment>().unwrap(), Environment::Local);
        assert_eq!("staging".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!(Environment::from_tag("development"), Environment::Development);
    }

    #[test]
    fn test_unknown_tag_is_production() {
        assert!("Local".parse::<Environment>().is_err()); // Case sensitive
        assert_eq!(Environment::from_tag("qa"), Environment::Production);
        assert_eq!(Environment::from_tag(""), Environment::Production);
        assert_eq!(Environment::default(), Environment::Production);
    }

    #[test]
    fn test_display_roundtrips_tag() {
        for env in [
            Environment::Local,
            Environment::Development,
            Environment::Staging,
            Environment::Production,
        ] {
            assert_eq!(Environment::from_tag(&env.to_string()), env);
        }
        assert!(Environment::Local.is_local());
        assert!(!Environment::Staging.is_local());
    }
}
