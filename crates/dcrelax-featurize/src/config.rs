//! Naming configuration for relaxed templates.
//!
//! Both names come from the surrounding session (dataset loader, candidate
//! pool builder) and are injected here instead of being read from globals.
//!
//! ```
//! use dcrelax_featurize::RelaxConfig;
//!
//! let config = RelaxConfig::from_json_str(r#"{ "index_name": "_tid_" }"#).unwrap();
//! assert_eq!(config.index_name, "_tid_");
//! assert_eq!(config.pool_alias, "postab");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_INDEX_NAME: &str = "__ind";
pub const DEFAULT_POOL_ALIAS: &str = "postab";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelaxConfig {
    /// Row-identity column of the target relation.
    pub index_name: String,

    /// Alias of the candidate pool relation in rendered templates.
    pub pool_alias: String,
}

impl Default for RelaxConfig {
    fn default() -> Self {
        Self {
            index_name: DEFAULT_INDEX_NAME.to_string(),
            pool_alias: DEFAULT_POOL_ALIAS.to_string(),
        }
    }
}

impl RelaxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parses and validates configuration from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    pub fn with_pool_alias(mut self, pool_alias: impl Into<String>) -> Self {
        self.pool_alias = pool_alias.into();
        self
    }

    /// Both names are spliced into templates unquoted, so they must be plain
    /// identifiers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("index_name", &self.index_name),
            ("pool_alias", &self.pool_alias),
        ] {
            if !is_identifier(value) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be a non-empty identifier, got `{value}`"
                )));
            }
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
