//! protogen.toml parsing

use anyhow::{Context, Result};
use protogen_core::{Transformer, TypeMappings};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// protogen.toml structure
///
/// ```toml
/// [mappings."chrono::DateTime"]
/// schema_name = "google.protobuf.Timestamp"
/// import_path = "google/protobuf/timestamp.proto"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Custom type mappings, consulted before the built-in ones.
    #[serde(default)]
    pub mappings: TypeMappings,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config: {:?}", path.as_ref()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config: {:?}", path.as_ref()))
    }

    /// Parse configuration from a string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config")
    }

    /// Build a transformer with this configuration's mappings.
    pub fn transformer(&self) -> Result<Transformer> {
        Transformer::builder()
            .mappings(self.mappings.clone())
            .build()
            .context("Invalid type mapping configuration")
    }
}

#[cfg(test)]
#[path = "config/config_tests.rs"]
mod config_tests;
