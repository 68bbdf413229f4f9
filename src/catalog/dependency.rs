//! Dependency descriptors and legacy bill-of-materials entries

use crate::checksum::Checksum;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// A concrete installable artifact from the buildpack catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyDescriptor {
    pub id: String,
    pub name: String,
    pub version: String,
    pub uri: String,

    /// Namespaced checksum (`sha256:…`)
    pub checksum: String,

    /// Bare sha256 from older catalogs
    pub sha256: String,

    pub stacks: Vec<String>,
    pub arch: String,
    pub os: String,
    pub source: String,

    #[serde(rename = "source-checksum")]
    pub source_checksum: String,

    pub cpe: String,
    pub purl: String,
    pub licenses: Vec<String>,

    #[serde(
        rename = "deprecation_date",
        deserialize_with = "deserialize_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub deprecation_date: Option<DateTime<Utc>>,

    #[serde(rename = "strip-components")]
    pub strip_components: usize,
}

impl DependencyDescriptor {
    /// The namespaced checksum, falling back to the legacy sha256 field.
    pub fn checksum(&self) -> Checksum {
        if !self.checksum.trim().is_empty() {
            Checksum::parse(&self.checksum)
        } else {
            Checksum::parse(&self.sha256)
        }
    }

    /// Human readable name, the catalog name or else the id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// File name a non-archive artifact is delivered under: the catalog
    /// name, or the last segment of the catalog URI when the entry has none.
    pub fn artifact_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        self.uri
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .filter(|segment| !segment.is_empty())
            .unwrap_or(&self.id)
            .to_string()
    }

    /// Whether the descriptor can be installed on `stack`
    pub fn supports_stack(&self, stack: &str) -> bool {
        self.stacks.iter().any(|s| s == "*" || s == stack)
    }

    /// Whether the descriptor was built for `arch` (untagged entries fit any arch)
    pub fn supports_arch(&self, arch: &str) -> bool {
        self.arch.is_empty() || self.arch == arch
    }
}

/// Accepts both TOML datetimes and quoted RFC 3339 / `YYYY-MM-DD` strings.
fn deserialize_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = match Option::<toml::Value>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(toml::Value::String(raw)) => raw,
        Some(toml::Value::Datetime(raw)) => raw.to_string(),
        Some(other) => {
            return Err(D::Error::custom(format!(
                "invalid deprecation date: {}",
                other
            )))
        }
    };

    if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| Some(at.and_utc()))
        .ok_or_else(|| D::Error::custom(format!("invalid deprecation date: {}", raw)))
}

/// Algorithm/hash pair as recorded in BOM metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomChecksum {
    pub algorithm: String,
    pub hash: String,
}

impl From<&Checksum> for BomChecksum {
    fn from(checksum: &Checksum) -> Self {
        let algorithm = match checksum.algorithm() {
            None | Some("sha256") => "SHA-256".to_string(),
            Some("sha512") => "SHA-512".to_string(),
            Some(other) => other.to_uppercase(),
        };
        Self {
            algorithm,
            hash: checksum.hash().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<BomChecksum>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomMetadata {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub architecture: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<BomChecksum>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub cpe: String,

    #[serde(
        rename = "deprecation-date",
        skip_serializing_if = "Option::is_none"
    )]
    pub deprecation_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<String>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub purl: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<BomSource>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub uri: String,

    pub version: String,
}

/// One `[[bom]]` entry in `build.toml` / `launch.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomEntry {
    pub name: String,
    pub metadata: BomMetadata,
}

impl BomEntry {
    pub fn from_dependency(dependency: &DependencyDescriptor) -> Self {
        let checksum = dependency.checksum();
        let source_checksum = Checksum::parse(&dependency.source_checksum);

        let source = (!dependency.source.is_empty()).then(|| BomSource {
            checksum: (!source_checksum.is_empty()).then(|| BomChecksum::from(&source_checksum)),
            uri: dependency.source.clone(),
        });

        Self {
            name: dependency.display_name().to_string(),
            metadata: BomMetadata {
                architecture: dependency.arch.clone(),
                checksum: (!checksum.is_empty()).then(|| BomChecksum::from(&checksum)),
                cpe: dependency.cpe.clone(),
                deprecation_date: dependency.deprecation_date,
                licenses: dependency.licenses.clone(),
                purl: dependency.purl.clone(),
                source,
                uri: dependency.uri.clone(),
                version: dependency.version.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> DependencyDescriptor {
        DependencyDescriptor {
            id: "pip".to_string(),
            name: "Pip".to_string(),
            version: "23.1.2".to_string(),
            uri: "https://example.com/pip.tgz".to_string(),
            checksum: "sha256:abc".to_string(),
            stacks: vec!["io.buildpacks.stacks.jammy".to_string()],
            source: "https://example.com/pip-src.tgz".to_string(),
            source_checksum: "sha256:def".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn checksum_prefers_namespaced_field() {
        let mut dependency = descriptor();
        dependency.sha256 = "legacy".to_string();
        assert_eq!(dependency.checksum().to_string(), "sha256:abc");
    }

    #[test]
    fn checksum_falls_back_to_sha256() {
        let mut dependency = descriptor();
        dependency.checksum = String::new();
        dependency.sha256 = "legacy".to_string();
        assert_eq!(dependency.checksum().to_string(), "legacy");
    }

    #[test]
    fn artifact_name_falls_back_to_uri_segment() {
        let mut dependency = descriptor();
        assert_eq!(dependency.artifact_name(), "Pip");

        dependency.name = String::new();
        dependency.uri = "file:///cache/Miniconda3-py312-Linux-x86_64.sh?download=1".to_string();
        assert_eq!(dependency.artifact_name(), "Miniconda3-py312-Linux-x86_64.sh");

        dependency.uri = "https://example.com/".to_string();
        assert_eq!(dependency.artifact_name(), "pip");
    }

    #[test]
    fn stack_matching_honours_wildcard() {
        let mut dependency = descriptor();
        assert!(dependency.supports_stack("io.buildpacks.stacks.jammy"));
        assert!(!dependency.supports_stack("other"));
        dependency.stacks.push("*".to_string());
        assert!(dependency.supports_stack("other"));
    }

    #[test]
    fn parse_catalog_entry() {
        let dependency: DependencyDescriptor = toml::from_str(
            r#"
id = "uv"
name = "uv"
version = "0.5.1"
uri = "https://example.com/uv.tar.gz"
checksum = "sha256:123"
stacks = ["*"]
arch = "amd64"
strip-components = 1
deprecation_date = 2026-01-01T00:00:00Z
"#,
        )
        .unwrap();
        assert_eq!(dependency.strip_components, 1);
        assert_eq!(
            dependency.deprecation_date.map(|d| d.to_rfc3339()),
            Some("2026-01-01T00:00:00+00:00".to_string())
        );
        assert!(dependency.supports_arch("amd64"));
        assert!(!dependency.supports_arch("arm64"));
    }

    #[test]
    fn parse_quoted_deprecation_date() {
        let dependency: DependencyDescriptor =
            toml::from_str(r#"deprecation_date = "2025-06-30""#).unwrap();
        assert!(dependency.deprecation_date.is_some());
    }

    #[test]
    fn bom_entry_from_dependency() {
        let entry = BomEntry::from_dependency(&descriptor());
        assert_eq!(entry.name, "Pip");
        assert_eq!(entry.metadata.version, "23.1.2");
        let checksum = entry.metadata.checksum.unwrap();
        assert_eq!(checksum.algorithm, "SHA-256");
        assert_eq!(checksum.hash, "abc");
        let source = entry.metadata.source.unwrap();
        assert_eq!(source.uri, "https://example.com/pip-src.tgz");
    }
}
