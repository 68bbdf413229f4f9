//! Configuration management for python-installers

pub mod schema;

pub use schema::{BuildSettings, BuildpackConfig, BuildpackInfo, CondaSolver};

use crate::error::{InstallerError, InstallerResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the buildpack descriptor inside the buildpack directory
pub const BUILDPACK_DESCRIPTOR: &str = "buildpack.toml";

/// Loads the buildpack descriptor
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Descriptor inside a buildpack directory
    pub fn for_buildpack(buildpack_dir: &Path) -> Self {
        Self::with_path(buildpack_dir.join(BUILDPACK_DESCRIPTOR))
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Load the descriptor; it must exist since it carries the catalog.
    pub fn load(&self) -> InstallerResult<BuildpackConfig> {
        if !self.config_path.exists() {
            return Err(InstallerError::ConfigNotFound(self.config_path.clone()));
        }

        Self::load_from_file(&self.config_path)
    }

    /// Load a descriptor from a specific file
    pub fn load_from_file(path: &Path) -> InstallerResult<BuildpackConfig> {
        debug!("Loading buildpack descriptor {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|e| InstallerError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| InstallerError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the descriptor path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
