//! Typed layer metadata
//!
//! Stored in the `[metadata]` table of `<layers>/<name>.toml`. Installers
//! record the checksum of the dependency they installed under their own key
//! (`dependency_checksum`, `dependency-checksum`, `dependency-sha`), plus the
//! time the layer was built.

use crate::checksum::Checksum;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

const BUILT_AT_KEY: &str = "built_at";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerMetadata {
    checksums: BTreeMap<String, Checksum>,
    built_at: Option<DateTime<Utc>>,
}

impl LayerMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata for a freshly installed dependency
    pub fn installed(key: &str, checksum: Checksum, built_at: DateTime<Utc>) -> Self {
        let mut metadata = Self::new();
        metadata.checksums.insert(key.to_string(), checksum);
        metadata.built_at = Some(built_at);
        metadata
    }

    /// Recorded checksum under `key`, if any
    pub fn checksum(&self, key: &str) -> Option<&Checksum> {
        self.checksums.get(key)
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    pub fn is_empty(&self) -> bool {
        self.checksums.is_empty() && self.built_at.is_none()
    }

    /// Read from a `[metadata]` table. Non-string values are ignored.
    pub fn from_table(table: &toml::Table) -> Self {
        let mut metadata = Self::new();
        for (key, value) in table {
            let Some(value) = value.as_str() else {
                continue;
            };
            if key == BUILT_AT_KEY {
                metadata.built_at = DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|at| at.with_timezone(&Utc));
            } else {
                metadata.checksums.insert(key.clone(), Checksum::parse(value));
            }
        }
        metadata
    }

    pub fn to_table(&self) -> toml::Table {
        let mut table = toml::Table::new();
        for (key, checksum) in &self.checksums {
            table.insert(key.clone(), toml::Value::String(checksum.to_string()));
        }
        if let Some(built_at) = self.built_at {
            table.insert(
                BUILT_AT_KEY.to_string(),
                toml::Value::String(built_at.to_rfc3339()),
            );
        }
        table
    }
}
