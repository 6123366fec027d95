//! Adapter connection parameters loaded from YAML.
//!
//! Example document:
//!
//! ```yaml
//! host: "localhost"
//! user: "dbuser"
//! pass: "dbuserpass"
//! database: "paper.db"
//! prefix: "wp_"
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt::{Debug, Formatter};
use std::path::Path;

/// Host value that selects the local (file) connection form.
pub const LOCAL_HOST: &str = "localhost";

#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
    pub database: String,
    /// Prepended to every entity table suffix. May be empty.
    pub prefix: String,
}

impl AdapterConfig {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Local-file configuration, handy for tests and tools.
    pub fn local(database: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            host: LOCAL_HOST.to_string(),
            database: database.into(),
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }
}

impl Debug for AdapterConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("database", &self.database)
            .field("prefix", &self.prefix)
            .finish()
    }
}
