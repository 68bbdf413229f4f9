//! Error types for python-installers
//!
//! All modules use `InstallerResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for installer operations
pub type InstallerResult<T> = Result<T, InstallerError>;

/// All errors that can occur while provisioning installers
#[derive(Error, Debug)]
pub enum InstallerError {
    // Configuration errors
    #[error("empty plan should not happen")]
    EmptyPlan,

    #[error("unknown plan: {0}")]
    UnknownPlanEntry(String),

    #[error("missing plan for: {0}")]
    MissingParameters(String),

    #[error(
        "conflicting versions for {tool} from {source_name}: '{first}' and '{second}'"
    )]
    ConflictingVersions {
        tool: String,
        source_name: String,
        first: String,
        second: String,
    },

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Invalid version constraint '{constraint}' for {id}: {reason}")]
    InvalidConstraint {
        id: String,
        constraint: String,
        reason: String,
    },

    // Resolution errors
    #[error(
        "failed to satisfy \"{id}\" dependency version constraint \"{version}\": no compatible versions on \"{stack}\" stack. Supported versions are: [{}]",
        .supported.join(", ")
    )]
    DependencyNotFound {
        id: String,
        version: String,
        stack: String,
        supported: Vec<String>,
    },

    // Delivery and installation errors
    #[error("failed to fetch dependency from {uri}: {reason}")]
    Download { uri: String, reason: String },

    #[error("checksum does not match for {uri}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        uri: String,
        expected: String,
        actual: String,
    },

    #[error("Unsupported archive format: {0}")]
    UnsupportedArchive(String),

    #[error("arch {0} is not supported")]
    UnsupportedArch(String),

    #[error("{tool} installation failed: site packages are missing from the {tool} layer")]
    SitePackagesMissing { tool: String },

    #[error("Invalid layer name '{name}': {reason}")]
    LayerName { name: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command}:\n{output}")]
    CommandExecution { command: String, output: String },

    // SBOM errors
    #[error("unsupported SBOM format: '{0}'")]
    UnsupportedSbomFormat(String),

    #[error("failed to generate SBOM for {name}: {reason}")]
    Sbom { name: String, reason: String },

    // Step context
    #[error("{installer}: {source}")]
    Step {
        installer: String,
        #[source]
        source: Box<InstallerError>,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl InstallerError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Attach the failing installer's name.
    ///
    /// Configuration and resolution errors pass through untouched.
    pub fn in_step(self, installer: impl Into<String>) -> Self {
        if self.is_configuration()
            || matches!(self, Self::Step { .. } | Self::DependencyNotFound { .. })
        {
            return self;
        }
        Self::Step {
            installer: installer.into(),
            source: Box::new(self),
        }
    }

    /// Check if error is a plan or buildpack configuration problem
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EmptyPlan
                | Self::UnknownPlanEntry(_)
                | Self::MissingParameters(_)
                | Self::ConflictingVersions { .. }
                | Self::ConfigInvalid { .. }
                | Self::ConfigNotFound(_)
                | Self::InvalidConstraint { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::EmptyPlan => Some("The detect phase must contribute at least one plan entry"),
            Self::UnknownPlanEntry(_) => {
                Some("Known entries are: pip, pipenv, poetry, conda, uv, pixi")
            }
            Self::ConflictingVersions { .. } => {
                Some("Make sure a version source only requests one version per tool")
            }
            Self::DependencyNotFound { .. } => {
                Some("Check the requested BP_*_VERSION against the buildpack.toml dependencies")
            }
            Self::UnsupportedArch(_) => Some("Set BP_ARCH to amd64 or arm64"),
            Self::ConfigNotFound(_) => Some("Pass --buildpack-dir or set CNB_BUILDPACK_DIR"),
            Self::Step { source, .. } => source.hint(),
            _ => None,
        }
    }
}
