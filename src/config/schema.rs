//! Configuration schema for python-installers
//!
//! The buildpack descriptor lives at `<buildpack-dir>/buildpack.toml`;
//! per-build settings come from `BP_*` environment variables.

use crate::catalog::DependencyDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Root of `buildpack.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildpackConfig {
    /// Buildpack API version
    pub api: String,

    /// Identity and SBOM settings
    pub buildpack: BuildpackInfo,

    /// Dependency catalog
    pub metadata: BuildpackMetadata,
}

/// `[buildpack]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildpackInfo {
    pub id: String,
    pub name: String,
    pub version: String,

    /// SBOM media types to emit for every layer
    #[serde(rename = "sbom-formats")]
    pub sbom_formats: Vec<String>,
}

impl Default for BuildpackInfo {
    fn default() -> Self {
        Self {
            id: "paketo-buildpacks/python-installers".to_string(),
            name: "Paketo Buildpack for Python Installers".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            sbom_formats: Vec::new(),
        }
    }
}

/// `[metadata]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildpackMetadata {
    /// `[[metadata.dependencies]]`
    pub dependencies: Vec<DependencyDescriptor>,

    /// `[metadata.default-versions]`, constraint per dependency id
    #[serde(rename = "default-versions")]
    pub default_versions: BTreeMap<String, String>,
}

/// Solver configured into a miniconda installation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CondaSolver {
    #[default]
    Classic,
    Mamba,
}

impl fmt::Display for CondaSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classic => write!(f, "classic"),
            Self::Mamba => write!(f, "mamba"),
        }
    }
}

/// Settings read from the build environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// `BP_LOG_LEVEL=DEBUG` enables debug logging
    pub debug: bool,

    /// `BP_CONDA_SOLVER`
    pub conda_solver: CondaSolver,

    /// Target architecture in catalog notation (`amd64`, `arm64`), `BP_ARCH` overrides the host
    pub arch: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            debug: false,
            conda_solver: CondaSolver::Classic,
            arch: host_arch(),
        }
    }
}

impl BuildSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let debug = lookup("BP_LOG_LEVEL")
            .map(|level| level.eq_ignore_ascii_case("debug"))
            .unwrap_or(false);

        let conda_solver = match lookup("BP_CONDA_SOLVER") {
            Some(solver) if solver.trim().eq_ignore_ascii_case("mamba") => CondaSolver::Mamba,
            _ => CondaSolver::Classic,
        };

        let arch = lookup("BP_ARCH")
            .map(|arch| arch.trim().to_string())
            .filter(|arch| !arch.is_empty())
            .unwrap_or_else(host_arch);

        Self {
            debug,
            conda_solver,
            arch,
        }
    }
}

/// The host architecture in catalog notation
pub fn host_arch() -> String {
    match std::env::consts::ARCH {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    }
}
