//! Software bill of materials for installed layers
//!
//! Every installer attaches an SBOM describing the dependency it placed in
//! its layer. The buildpack descriptor lists the media types to emit; each
//! one is written next to the layer as `<name>.sbom.<extension>`.

use crate::catalog::DependencyDescriptor;
use crate::error::{InstallerError, InstallerResult};
use chrono::Utc;
use serde_json::{json, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// Supported SBOM document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SbomFormat {
    CycloneDx,
    Spdx,
    Syft,
}

impl SbomFormat {
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::CycloneDx => "application/vnd.cyclonedx+json",
            Self::Spdx => "application/spdx+json",
            Self::Syft => "application/vnd.syft+json",
        }
    }

    /// File extension used by the platform (`<layer>.sbom.<extension>`)
    pub fn extension(&self) -> &'static str {
        match self {
            Self::CycloneDx => "cdx.json",
            Self::Spdx => "spdx.json",
            Self::Syft => "syft.json",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::CycloneDx, Self::Spdx, Self::Syft]
    }
}

impl fmt::Display for SbomFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.media_type())
    }
}

impl FromStr for SbomFormat {
    type Err = InstallerError;

    /// Accepts media types with an optional `;version=` parameter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let media_type = s.split(';').next().unwrap_or_default().trim();
        Self::all()
            .iter()
            .copied()
            .find(|format| format.media_type() == media_type)
            .ok_or_else(|| InstallerError::UnsupportedSbomFormat(s.to_string()))
    }
}

/// A package recorded in an SBOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbomPackage {
    pub name: String,
    pub version: String,
    pub cpe: String,
    pub purl: String,
    pub licenses: Vec<String>,
    pub download_location: String,
}

/// Format-neutral SBOM content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sbom {
    pub target: PathBuf,
    pub packages: Vec<SbomPackage>,
}

impl Sbom {
    pub fn from_dependency(dependency: &DependencyDescriptor, target: &Path) -> Self {
        Self {
            target: target.to_path_buf(),
            packages: vec![SbomPackage {
                name: dependency.display_name().to_string(),
                version: dependency.version.clone(),
                cpe: dependency.cpe.clone(),
                purl: dependency.purl.clone(),
                licenses: dependency.licenses.clone(),
                download_location: dependency.uri.clone(),
            }],
        }
    }

    /// Render the SBOM in every requested media type.
    pub fn in_formats(&self, formats: &[String]) -> InstallerResult<FormattedSbom> {
        let mut documents = Vec::with_capacity(formats.len());
        for raw in formats {
            let format: SbomFormat = raw.parse()?;
            let content = match format {
                SbomFormat::CycloneDx => self.cyclonedx(),
                SbomFormat::Spdx => self.spdx(),
                SbomFormat::Syft => self.syft(),
            };
            documents.push(SbomDocument {
                format,
                content: serde_json::to_string_pretty(&content)?,
            });
        }
        Ok(FormattedSbom { documents })
    }

    fn cyclonedx(&self) -> Value {
        let components: Vec<Value> = self
            .packages
            .iter()
            .map(|package| {
                let licenses: Vec<Value> = package
                    .licenses
                    .iter()
                    .map(|id| json!({ "license": { "id": id } }))
                    .collect();
                json!({
                    "type": "library",
                    "name": package.name,
                    "version": package.version,
                    "cpe": package.cpe,
                    "purl": package.purl,
                    "licenses": licenses,
                })
            })
            .collect();

        json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.3",
            "serialNumber": format!("urn:uuid:{}", Uuid::new_v4()),
            "version": 1,
            "metadata": {
                "component": {
                    "type": "file",
                    "name": self.target.display().to_string(),
                },
            },
            "components": components,
        })
    }

    fn spdx(&self) -> Value {
        let packages: Vec<Value> = self
            .packages
            .iter()
            .enumerate()
            .map(|(index, package)| {
                let mut references = Vec::new();
                if !package.cpe.is_empty() {
                    references.push(json!({
                        "referenceCategory": "SECURITY",
                        "referenceType": "cpe23Type",
                        "referenceLocator": package.cpe,
                    }));
                }
                if !package.purl.is_empty() {
                    references.push(json!({
                        "referenceCategory": "PACKAGE_MANAGER",
                        "referenceType": "purl",
                        "referenceLocator": package.purl,
                    }));
                }
                let declared = if package.licenses.is_empty() {
                    "NOASSERTION".to_string()
                } else {
                    package.licenses.join(" AND ")
                };
                let location = if package.download_location.is_empty() {
                    "NOASSERTION"
                } else {
                    package.download_location.as_str()
                };
                json!({
                    "SPDXID": format!("SPDXRef-Package-{}", index),
                    "name": package.name,
                    "versionInfo": package.version,
                    "downloadLocation": location,
                    "licenseConcluded": "NOASSERTION",
                    "licenseDeclared": declared,
                    "externalRefs": references,
                })
            })
            .collect();

        json!({
            "spdxVersion": "SPDX-2.2",
            "dataLicense": "CC0-1.0",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": self.target.display().to_string(),
            "documentNamespace": format!(
                "https://python-installers/sbom/{}",
                Uuid::new_v4()
            ),
            "creationInfo": {
                "created": Utc::now().to_rfc3339(),
                "creators": [format!("Tool: python-installers-{}", env!("CARGO_PKG_VERSION"))],
            },
            "packages": packages,
        })
    }

    fn syft(&self) -> Value {
        let artifacts: Vec<Value> = self
            .packages
            .iter()
            .map(|package| {
                let cpes: Vec<&str> = if package.cpe.is_empty() {
                    Vec::new()
                } else {
                    vec![package.cpe.as_str()]
                };
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "name": package.name,
                    "version": package.version,
                    "type": "UnknownPackage",
                    "locations": [{ "path": self.target.display().to_string() }],
                    "licenses": package.licenses,
                    "cpes": cpes,
                    "purl": package.purl,
                })
            })
            .collect();

        json!({
            "artifacts": artifacts,
            "source": {
                "type": "directory",
                "target": self.target.display().to_string(),
            },
            "schema": { "version": "3.0.1" },
        })
    }
}

/// One rendered SBOM document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbomDocument {
    pub format: SbomFormat,
    pub content: String,
}

/// The SBOM rendered in every requested format
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedSbom {
    pub documents: Vec<SbomDocument>,
}

impl FormattedSbom {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, format: SbomFormat) -> Option<&str> {
        self.documents
            .iter()
            .find(|d| d.format == format)
            .map(|d| d.content.as_str())
    }
}

/// Produces SBOM content for an installed dependency
pub trait SbomGenerator {
    fn generate_from_dependency(
        &self,
        dependency: &DependencyDescriptor,
        dir: &Path,
    ) -> InstallerResult<Sbom>;
}

/// Builds the SBOM from catalog metadata alone
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencySbomGenerator;

impl SbomGenerator for DependencySbomGenerator {
    fn generate_from_dependency(
        &self,
        dependency: &DependencyDescriptor,
        dir: &Path,
    ) -> InstallerResult<Sbom> {
        if dependency.version.is_empty() {
            return Err(InstallerError::Sbom {
                name: dependency.display_name().to_string(),
                reason: "dependency has no version".to_string(),
            });
        }
        Ok(Sbom::from_dependency(dependency, dir))
    }
}
