//! The layers root directory
//!
//! Layout after a build:
//!
//! ```text
//! <layers>/
//!   pip/                      layer contents
//!     env/PYTHONPATH.prepend
//!   pip.toml                  [types] + [metadata]
//!   pip.sbom.cdx.json
//!   build.toml                [[bom]] for build-time layers
//!   launch.toml               [[bom]] for launch-time layers
//! ```

use crate::build::BuildResult;
use crate::catalog::BomEntry;
use crate::error::{InstallerError, InstallerResult};
use crate::layer::{Layer, LayerMetadata};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct LayerTypesFile {
    build: bool,
    launch: bool,
    cache: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct LayerFile {
    types: LayerTypesFile,
    metadata: toml::Table,
}

#[derive(Debug, Serialize)]
struct BomFile<'a> {
    bom: &'a [BomEntry],
}

/// Access to the layers of one buildpack
#[derive(Debug, Clone)]
pub struct Layers {
    root: PathBuf,
}

impl Layers {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn sidecar(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.toml", name))
    }

    /// Fetch a layer with whatever types and metadata a previous build left.
    ///
    /// A missing sidecar yields an empty layer. The directory is not created.
    pub fn get(&self, name: &str) -> InstallerResult<Layer> {
        validate_layer_name(name)?;

        let sidecar = self.sidecar(name);
        let file = match fs::read_to_string(&sidecar) {
            Ok(content) => {
                toml::from_str::<LayerFile>(&content).map_err(|e| InstallerError::ConfigInvalid {
                    path: sidecar.clone(),
                    reason: e.to_string(),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LayerFile::default(),
            Err(e) => {
                return Err(InstallerError::io(
                    format!("reading layer metadata {}", sidecar.display()),
                    e,
                ))
            }
        };

        Ok(Layer {
            name: name.to_string(),
            path: self.root.join(name),
            build: file.types.build,
            launch: file.types.launch,
            cache: file.types.cache,
            metadata: LayerMetadata::from_table(&file.metadata),
            ..Default::default()
        })
    }

    /// Write a layer's sidecar, env directories and SBOM files.
    pub fn write(&self, layer: &Layer) -> InstallerResult<()> {
        validate_layer_name(&layer.name)?;

        let file = LayerFile {
            types: LayerTypesFile {
                build: layer.build,
                launch: layer.launch,
                cache: layer.cache,
            },
            metadata: layer.metadata.to_table(),
        };
        let sidecar = self.sidecar(&layer.name);
        fs::write(&sidecar, toml::to_string_pretty(&file)?).map_err(|e| {
            InstallerError::io(format!("writing layer metadata {}", sidecar.display()), e)
        })?;

        layer.shared_env.write_to(&layer.path.join("env"))?;
        layer.build_env.write_to(&layer.path.join("env.build"))?;
        layer.launch_env.write_to(&layer.path.join("env.launch"))?;

        for document in &layer.sbom.documents {
            let path = self
                .root
                .join(format!("{}.sbom.{}", layer.name, document.format.extension()));
            fs::write(&path, &document.content)
                .map_err(|e| InstallerError::io(format!("writing SBOM {}", path.display()), e))?;
        }

        debug!("Wrote layer {}", layer.name);
        Ok(())
    }

    /// Persist a complete build result and drop layers it did not return.
    pub fn persist(&self, result: &BuildResult) -> InstallerResult<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| InstallerError::io(format!("creating {}", self.root.display()), e))?;

        for layer in &result.layers {
            self.write(layer)?;
        }

        self.write_bom("build.toml", &result.build_bom)?;
        self.write_bom("launch.toml", &result.launch_bom)?;
        self.remove_unlisted(result)
    }

    fn write_bom(&self, file_name: &str, bom: &[BomEntry]) -> InstallerResult<()> {
        let path = self.root.join(file_name);
        if bom.is_empty() {
            return match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(InstallerError::io(format!("removing {}", path.display()), e)),
            };
        }

        let content = toml::to_string_pretty(&BomFile { bom })?;
        fs::write(&path, content)
            .map_err(|e| InstallerError::io(format!("writing {}", path.display()), e))
    }

    /// Scratch layers (downloads, install scripts) are never returned, so
    /// they disappear here.
    fn remove_unlisted(&self, result: &BuildResult) -> InstallerResult<()> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| InstallerError::io(format!("listing {}", self.root.display()), e))?;

        for entry in entries {
            let entry = entry
                .map_err(|e| InstallerError::io(format!("listing {}", self.root.display()), e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if result.layers.iter().any(|layer| layer.name == name) {
                continue;
            }

            debug!("Removing unused layer {}", name);
            fs::remove_dir_all(&path)
                .map_err(|e| InstallerError::io(format!("removing {}", path.display()), e))?;
            let sidecar = self.sidecar(name);
            if sidecar.exists() {
                fs::remove_file(&sidecar).map_err(|e| {
                    InstallerError::io(format!("removing {}", sidecar.display()), e)
                })?;
            }
        }

        Ok(())
    }
}

/// Layer names become directory names, so no separators or traversal.
fn validate_layer_name(name: &str) -> InstallerResult<()> {
    if name.is_empty() {
        return Err(InstallerError::LayerName {
            name: name.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") || name.contains('\0') {
        return Err(InstallerError::LayerName {
            name: name.to_string(),
            reason: "must not contain path separators or '..'".to_string(),
        });
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(InstallerError::LayerName {
            name: name.to_string(),
            reason: "must contain only alphanumeric characters, dots, hyphens, or underscores"
                .to_string(),
        });
    }
    Ok(())
}
