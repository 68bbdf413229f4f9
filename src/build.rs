//! Inputs and outputs of one buildpack build

use crate::catalog::BomEntry;
use crate::clock::Clock;
use crate::config::BuildpackInfo;
use crate::layer::{Layer, Layers};
use crate::plan::Plan;
use crate::sbom::SbomGenerator;
use std::path::PathBuf;

/// Everything the platform hands to a build
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub buildpack: BuildpackInfo,

    /// Buildpack directory, holds `buildpack.toml`
    pub cnb_path: PathBuf,

    /// Platform directory (bindings)
    pub platform_path: PathBuf,

    pub layers: Layers,
    pub plan: Plan,
    pub stack: String,
}

impl BuildContext {
    pub fn manifest_path(&self) -> PathBuf {
        self.cnb_path.join(crate::config::BUILDPACK_DESCRIPTOR)
    }
}

/// Layers and bills of materials produced by a build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildResult {
    pub layers: Vec<Layer>,
    pub build_bom: Vec<BomEntry>,
    pub launch_bom: Vec<BomEntry>,
}

impl BuildResult {
    /// Append another result, keeping order.
    pub fn extend(&mut self, other: BuildResult) {
        self.layers.extend(other.layers);
        self.build_bom.extend(other.build_bom);
        self.launch_bom.extend(other.launch_bom);
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }
}

/// Collaborators shared by every installer
pub struct CommonBuildParameters {
    pub sbom_generator: Box<dyn SbomGenerator>,
    pub clock: Clock,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(name: &str) -> Layer {
        Layer {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn bom(name: &str) -> BomEntry {
        BomEntry {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn extend_preserves_order() {
        let mut result = BuildResult {
            layers: vec![layer("pip"), layer("pip-source")],
            build_bom: vec![bom("pip")],
            launch_bom: Vec::new(),
        };
        result.extend(BuildResult {
            layers: vec![layer("pipenv")],
            build_bom: vec![bom("pipenv")],
            launch_bom: vec![bom("pipenv")],
        });

        let names: Vec<&str> = result.layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["pip", "pip-source", "pipenv"]);
        assert_eq!(result.build_bom.len(), 2);
        assert_eq!(result.launch_bom.len(), 1);
        assert!(result.layer("pipenv").is_some());
        assert!(result.layer("uv").is_none());
    }
}
