//! Python package-manager installers
//!
//! Every installer runs the same build step (see [`step`]): resolve a
//! version, look the dependency up in the catalog, reuse or rebuild the
//! layer, attach an SBOM. Only the install mechanics differ:
//!
//! | Installer | Plan entry | Layer | Checksum key | Catalog id |
//! |-----------|------------|-------|--------------|------------|
//! | pip | `pip` | `pip` (+ `pip-source`) | `dependency_checksum` | `pip` |
//! | pipenv | `pipenv` | `pipenv` | `dependency_checksum` | `pipenv` |
//! | poetry | `poetry` | `poetry` | `dependency-checksum` | `poetry` |
//! | miniconda | `conda` | `conda` | `dependency-sha` | `miniconda3` |
//! | uv | `uv` | `uv` | `dependency-sha` | `uv` |
//! | pixi | `pixi` | `pixi` | `dependency-sha` | `pixi` |

pub mod binary;
pub mod miniconda;
pub mod pip;
pub mod pipenv;
pub mod pixi;
pub mod poetry;
pub mod site;
pub mod step;
pub mod uv;

use crate::error::InstallerError;
use std::fmt;
use std::str::FromStr;

/// Known installers, in the order they are built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Installer {
    Pip,
    Pipenv,
    Poetry,
    Miniconda,
    Uv,
    Pixi,
}

impl Installer {
    /// Later installers may read earlier installers' layers (poetry uses pip's).
    pub const PRIORITY_ORDER: [Installer; 6] = [
        Self::Pip,
        Self::Pipenv,
        Self::Poetry,
        Self::Miniconda,
        Self::Uv,
        Self::Pixi,
    ];

    /// Build plan entry name
    pub fn plan_name(&self) -> &'static str {
        match self {
            Self::Pip => "pip",
            Self::Pipenv => "pipenv",
            Self::Poetry => "poetry",
            Self::Miniconda => "conda",
            Self::Uv => "uv",
            Self::Pixi => "pixi",
        }
    }

    /// Name of the layer the tool is installed into
    pub fn layer_name(&self) -> &'static str {
        self.plan_name()
    }

    /// Catalog dependency id
    pub fn dependency_id(&self) -> &'static str {
        match self {
            Self::Miniconda => "miniconda3",
            other => other.plan_name(),
        }
    }

    /// Layer metadata key holding the installed dependency checksum
    pub fn checksum_key(&self) -> &'static str {
        match self {
            Self::Pip | Self::Pipenv => "dependency_checksum",
            Self::Poetry => "dependency-checksum",
            Self::Miniconda | Self::Uv | Self::Pixi => "dependency-sha",
        }
    }

    /// Environment variable overriding the version
    pub fn version_env(&self) -> &'static str {
        match self {
            Self::Pip => "BP_PIP_VERSION",
            Self::Pipenv => "BP_PIPENV_VERSION",
            Self::Poetry => "BP_POETRY_VERSION",
            Self::Miniconda => "BP_MINICONDA_VERSION",
            Self::Uv => "BP_UV_VERSION",
            Self::Pixi => "BP_PIXI_VERSION",
        }
    }

    /// Version sources the resolver honours, highest priority first
    pub fn priorities(&self) -> [&'static str; 1] {
        [self.version_env()]
    }

    /// Name used in operator-facing logs
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pip => "Pip",
            Self::Pipenv => "Pipenv",
            Self::Poetry => "Poetry",
            Self::Miniconda => "Miniconda",
            Self::Uv => "uv",
            Self::Pixi => "pixi",
        }
    }
}

impl fmt::Display for Installer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.plan_name())
    }
}

impl FromStr for Installer {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::PRIORITY_ORDER
            .iter()
            .copied()
            .find(|installer| installer.plan_name() == s)
            .ok_or_else(|| InstallerError::UnknownPlanEntry(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plan_names() {
        assert_eq!("pip".parse::<Installer>().unwrap(), Installer::Pip);
        assert_eq!("conda".parse::<Installer>().unwrap(), Installer::Miniconda);
        assert_eq!("pixi".parse::<Installer>().unwrap(), Installer::Pixi);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = "miniconda".parse::<Installer>().unwrap_err();
        assert!(matches!(err, InstallerError::UnknownPlanEntry(ref name) if name == "miniconda"));
        assert!("cpython".parse::<Installer>().is_err());
    }

    #[test]
    fn priority_order_is_fixed() {
        let names: Vec<&str> = Installer::PRIORITY_ORDER
            .iter()
            .map(|i| i.plan_name())
            .collect();
        assert_eq!(names, vec!["pip", "pipenv", "poetry", "conda", "uv", "pixi"]);
    }

    #[test]
    fn miniconda_identifiers() {
        let installer = Installer::Miniconda;
        assert_eq!(installer.dependency_id(), "miniconda3");
        assert_eq!(installer.layer_name(), "conda");
        assert_eq!(installer.checksum_key(), "dependency-sha");
        assert_eq!(installer.priorities(), ["BP_MINICONDA_VERSION"]);
    }
}
