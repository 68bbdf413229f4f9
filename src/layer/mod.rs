//! Filesystem-backed build layers
//!
//! A layer is a named directory under the layers root plus a
//! `<name>.toml` sidecar holding its types and metadata. Installers fetch
//! their layer at the start of a build step, either hand it back untouched
//! (cache hit) or reset it and install into it.

pub mod env;
pub mod metadata;
pub mod store;

pub use env::{EnvMutation, EnvOperation, Environment};
pub use metadata::LayerMetadata;
pub use store::Layers;

use crate::error::{InstallerError, InstallerResult};
use crate::planner::LayerTypes;
use crate::sbom::FormattedSbom;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// A named unit of build output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    pub path: PathBuf,

    pub build: bool,
    pub launch: bool,
    pub cache: bool,

    pub metadata: LayerMetadata,

    /// Environment for both build and launch
    pub shared_env: Environment,
    pub build_env: Environment,
    pub launch_env: Environment,

    pub sbom: FormattedSbom,
}

impl Layer {
    /// Set the layer types from a merged plan decision
    pub fn apply_types(&mut self, types: LayerTypes) {
        self.build = types.build;
        self.launch = types.launch;
        self.cache = types.cache();
    }

    /// Clear the layer: contents, types, metadata, environment and SBOM.
    pub fn reset(self) -> InstallerResult<Layer> {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(InstallerError::io(
                    format!("clearing layer {}", self.path.display()),
                    e,
                ))
            }
        }

        fs::create_dir_all(&self.path).map_err(|e| {
            InstallerError::io(format!("creating layer {}", self.path.display()), e)
        })?;

        Ok(Layer {
            name: self.name,
            path: self.path,
            ..Default::default()
        })
    }
}
