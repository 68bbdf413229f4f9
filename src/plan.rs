//! Build plan entries handed over by the detect phase
//!
//! The plan file is TOML:
//!
//! ```toml
//! [[entries]]
//! name = "pip"
//!
//! [entries.metadata]
//! build = true
//! launch = false
//! version = "23.1"
//! version-source = "BP_PIP_VERSION"
//! ```

use crate::error::{InstallerError, InstallerResult};
use crate::installers::Installer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Buildpack specific data attached to a plan entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanMetadata {
    /// The dependency is needed at build time
    pub build: bool,

    /// The dependency is needed at launch time
    pub launch: bool,

    /// Requested version or constraint, empty when none was requested
    pub version: String,

    /// Where `version` came from (e.g. an environment variable name)
    #[serde(rename = "version-source")]
    pub version_source: String,
}

/// One requirement contributed to the build plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub name: String,

    #[serde(default)]
    pub metadata: PlanMetadata,
}

impl PlanEntry {
    /// An entry that only asserts the tool should exist
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: PlanMetadata::default(),
        }
    }

    pub fn with_flags(mut self, build: bool, launch: bool) -> Self {
        self.metadata.build = build;
        self.metadata.launch = launch;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>, source: impl Into<String>) -> Self {
        self.metadata.version = version.into();
        self.metadata.version_source = source.into();
        self
    }
}

/// The ordered list of plan entries for one build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn new(entries: Vec<PlanEntry>) -> Self {
        Self { entries }
    }

    /// Load a plan from a TOML file
    pub fn load(path: &Path) -> InstallerResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| InstallerError::io(format!("reading plan from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| InstallerError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct entry names in declaration order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.name.as_str()) {
                names.push(&entry.name);
            }
        }
        names
    }

    /// Add a versioned entry for every planned installer whose
    /// `BP_*_VERSION` variable is set. Installers absent from the plan are
    /// never added.
    pub fn with_version_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut overrides = Vec::new();
        for name in self.names() {
            let Ok(installer) = name.parse::<Installer>() else {
                continue;
            };
            let variable = installer.version_env();
            let Some(version) = lookup(variable).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            let version = match installer {
                Installer::Pip => expand_pip_version(version.trim()),
                _ => version.trim().to_string(),
            };
            debug!("{} requested {} {}", variable, name, version);
            overrides.push(PlanEntry::named(name).with_version(version, variable));
        }
        self.entries.extend(overrides);
        self
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_version_overrides(|name| std::env::var(name).ok())
    }
}

/// Pip publishes `X.Y` rather than `X.Y.0`, so an exact `X.Y` request is
/// pinned to `X.Y.0` instead of matching the newest `X.Y.Z`.
fn expand_pip_version(version: &str) -> String {
    let parts: Vec<&str> = version.split('.').collect();
    let is_major_minor = parts.len() == 2
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));

    if is_major_minor {
        format!("{}.0", version)
    } else {
        version.to_string()
    }
}
