//! Catalog lookup backed by `buildpack.toml`

use crate::catalog::archive::{self, ArtifactKind};
use crate::catalog::dependency::{BomEntry, DependencyDescriptor};
use crate::catalog::transport;
use crate::catalog::DependencyManager;
use crate::config::ConfigManager;
use crate::error::{InstallerError, InstallerResult};
use semver::{Version, VersionReq};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Resolves and delivers dependencies listed in the buildpack descriptor
#[derive(Debug, Clone)]
pub struct CatalogService {
    arch: String,
}

impl CatalogService {
    /// A catalog filtering dependencies for `arch` (`amd64`, `arm64`)
    pub fn new(arch: impl Into<String>) -> Self {
        Self { arch: arch.into() }
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }
}

impl DependencyManager for CatalogService {
    fn resolve(
        &self,
        manifest: &Path,
        id: &str,
        version: &str,
        stack: &str,
    ) -> InstallerResult<DependencyDescriptor> {
        let config = ConfigManager::load_from_file(manifest)?;

        let constraint = match version.trim() {
            "" | "default" => config
                .metadata
                .default_versions
                .get(id)
                .cloned()
                .unwrap_or_else(|| "*".to_string()),
            other => other.to_string(),
        };
        let requirement = parse_constraint(id, &constraint)?;

        let compatible: Vec<(Version, &DependencyDescriptor)> = config
            .metadata
            .dependencies
            .iter()
            .filter(|d| d.id == id && d.supports_stack(stack) && d.supports_arch(&self.arch))
            .filter_map(|d| lenient_version(&d.version).map(|v| (v, d)))
            .collect();

        let selected = compatible
            .iter()
            .filter(|(v, _)| requirement.matches(v))
            .max_by(|(left, _), (right, _)| left.cmp(right));

        match selected {
            Some((v, dependency)) => {
                debug!("Resolved {} {} to {}", id, constraint, v);
                Ok((*dependency).clone())
            }
            None => {
                let mut supported: Vec<&(Version, &DependencyDescriptor)> =
                    compatible.iter().collect();
                supported.sort_by(|(left, _), (right, _)| left.cmp(right));
                Err(InstallerError::DependencyNotFound {
                    id: id.to_string(),
                    version: constraint,
                    stack: stack.to_string(),
                    supported: supported.iter().map(|(_, d)| d.version.clone()).collect(),
                })
            }
        }
    }

    fn deliver(
        &self,
        dependency: &DependencyDescriptor,
        _cnb_path: &Path,
        destination: &Path,
        platform_path: &Path,
    ) -> InstallerResult<()> {
        let expected = dependency.checksum();
        let uri = match transport::mapped_uri(platform_path, &expected)? {
            Some(mapped) => mapped,
            None => dependency.uri.clone(),
        };

        fs::create_dir_all(destination)
            .map_err(|e| InstallerError::io(format!("creating {}", destination.display()), e))?;

        let kind = ArtifactKind::from_uri(&uri);
        let download = destination.join(format!(".{}.download", dependency.id));
        let actual = transport::fetch(&uri, &download)?;

        if !expected.is_empty() && !expected.matches(&actual) {
            if let Err(e) = fs::remove_file(&download) {
                debug!("Could not remove {}: {}", download.display(), e);
            }
            return Err(InstallerError::ChecksumMismatch {
                uri,
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }

        let outcome = match kind {
            ArtifactKind::File => {
                let target = destination.join(dependency.artifact_name());
                fs::rename(&download, &target).map_err(|e| {
                    InstallerError::io(format!("moving artifact to {}", target.display()), e)
                })
            }
            _ => archive::unpack(kind, &download, destination, dependency.strip_components),
        };

        if download.exists() {
            fs::remove_file(&download)
                .map_err(|e| InstallerError::io(format!("removing {}", download.display()), e))?;
        }
        outcome
    }

    fn generate_bill_of_materials(&self, dependencies: &[DependencyDescriptor]) -> Vec<BomEntry> {
        dependencies.iter().map(BomEntry::from_dependency).collect()
    }
}

/// Bare versions are exact (`1.2.3`) or prefix matches (`1.2`, `1`);
/// anything with an operator is a semver requirement.
fn parse_constraint(id: &str, constraint: &str) -> InstallerResult<VersionReq> {
    let constraint = constraint.trim();
    let is_bare = !constraint.is_empty()
        && constraint.split('.').count() <= 3
        && constraint
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));

    let normalized = if is_bare {
        format!("={}", constraint)
    } else {
        constraint.to_string()
    };

    VersionReq::parse(&normalized).map_err(|e| InstallerError::InvalidConstraint {
        id: id.to_string(),
        constraint: constraint.to_string(),
        reason: e.to_string(),
    })
}

/// Parse catalog versions, padding `X` and `X.Y` to three components.
fn lenient_version(raw: &str) -> Option<Version> {
    let raw = raw.trim().trim_start_matches('v');
    if let Ok(version) = Version::parse(raw) {
        return Some(version);
    }

    let (core, rest) = match raw.find(['-', '+']) {
        Some(index) => raw.split_at(index),
        None => (raw, ""),
    };
    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    Version::parse(&format!("{}{}", parts.join("."), rest)).ok()
}
