//! Dependency catalog lookup
//!
//! The catalog is the `[[metadata.dependencies]]` list of the buildpack
//! descriptor. Installers talk to it through [`DependencyManager`] so tests
//! can substitute a fake.

pub mod archive;
pub mod dependency;
pub mod service;
pub mod transport;

pub use dependency::{BomEntry, DependencyDescriptor};
pub use service::CatalogService;

use crate::error::InstallerResult;
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

/// Days before a deprecation date at which a warning is emitted
const DEPRECATION_WARNING_DAYS: i64 = 30;

/// Resolves, fetches and describes installable dependencies
pub trait DependencyManager {
    /// Pick the best dependency `id` matching `version` on `stack` from the
    /// descriptor at `manifest`.
    fn resolve(
        &self,
        manifest: &Path,
        id: &str,
        version: &str,
        stack: &str,
    ) -> InstallerResult<DependencyDescriptor>;

    /// Fetch the artifact into `destination`, unpacking archives.
    fn deliver(
        &self,
        dependency: &DependencyDescriptor,
        cnb_path: &Path,
        destination: &Path,
        platform_path: &Path,
    ) -> InstallerResult<()>;

    /// Legacy bill of materials entries
    fn generate_bill_of_materials(&self, dependencies: &[DependencyDescriptor]) -> Vec<BomEntry>;
}

/// Warning text when `dependency` is deprecated or about to be.
pub fn deprecation_warning(
    dependency: &DependencyDescriptor,
    now: DateTime<Utc>,
) -> Option<String> {
    let deprecated_at = dependency.deprecation_date?;
    let name = dependency.display_name();

    if now >= deprecated_at {
        Some(format!(
            "Version {} of {} is deprecated.",
            dependency.version, name
        ))
    } else if now + Duration::days(DEPRECATION_WARNING_DAYS) >= deprecated_at {
        Some(format!(
            "Version {} of {} will be deprecated after {}.",
            dependency.version,
            name,
            deprecated_at.format("%Y-%m-%d")
        ))
    } else {
        None
    }
}
