//! # Store Configuration
//!
//! Tunables for table allocation and path formatting. Every field has a
//! default, so a TOML file only needs the keys it overrides:
//!
//! ```toml
//! path_separator = "/"
//! path_prefix = "/"
//! initial_table_capacity = 64
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration for a [`World`](crate::World).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Rows reserved in every column when a table is created.
    pub initial_table_capacity: usize,
    /// Separator used by [`full_path`](crate::WorldView::full_path).
    pub path_separator: String,
    /// Prefix of absolute paths. `None` disables prefix handling.
    pub path_prefix: Option<String>,
    /// Parent chain length after which upward walks also track visited
    /// entities, so a cycle ends the walk instead of looping.
    pub max_hierarchy_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_table_capacity: 0,
            path_separator: ".".to_string(),
            path_prefix: Some("::".to_string()),
            max_hierarchy_depth: 1024,
        }
    }
}

impl StoreConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the document does not parse or
    /// a value is out of range.
    pub fn from_toml_str(source: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| StoreError::InvalidConfig(format!("Failed to parse: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConfigIo`] if the file cannot be read, otherwise
    /// as [`StoreConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| StoreError::ConfigIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] for an empty separator or a zero
    /// hierarchy depth.
    pub fn validate(&self) -> StoreResult<()> {
        if self.path_separator.is_empty() {
            return Err(StoreError::InvalidConfig(
                "path_separator must not be empty".to_string(),
            ));
        }
        if self.max_hierarchy_depth == 0 {
            return Err(StoreError::InvalidConfig(
                "max_hierarchy_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the path prefix, treating an empty string as none.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.path_prefix.as_deref().filter(|p| !p.is_empty())
    }
}
