//! Ordered environment variable mutations
//!
//! A layer contributes environment to later build steps and to the launch
//! image through files named `NAME.<operation>` inside one of the layer's
//! env directories:
//!
//! | Directory | Visible to |
//! |-----------|------------|
//! | `env/` | build and launch |
//! | `env.build/` | build only |
//! | `env.launch/` | launch only |
//!
//! `prepend` and `append` are joined with the existing value using the
//! delimiter stored in `NAME.delim`.

use crate::error::{InstallerError, InstallerResult};
use std::fmt;
use std::fs;
use std::path::Path;

/// How a mutation combines with an existing value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvOperation {
    Prepend,
    Append,
    Override,
    Default,
}

impl fmt::Display for EnvOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Prepend => "prepend",
            Self::Append => "append",
            Self::Override => "override",
            Self::Default => "default",
        };
        write!(f, "{}", name)
    }
}

/// One environment variable mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvMutation {
    pub name: String,
    pub operation: EnvOperation,
    pub value: String,
    pub delim: Option<String>,
}

/// Mutations in the order they were recorded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    mutations: Vec<EnvMutation>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepend(&mut self, name: &str, value: impl Into<String>, delim: &str) {
        self.push(name, EnvOperation::Prepend, value.into(), Some(delim));
    }

    pub fn append(&mut self, name: &str, value: impl Into<String>, delim: &str) {
        self.push(name, EnvOperation::Append, value.into(), Some(delim));
    }

    pub fn override_value(&mut self, name: &str, value: impl Into<String>) {
        self.push(name, EnvOperation::Override, value.into(), None);
    }

    pub fn default_value(&mut self, name: &str, value: impl Into<String>) {
        self.push(name, EnvOperation::Default, value.into(), None);
    }

    fn push(&mut self, name: &str, operation: EnvOperation, value: String, delim: Option<&str>) {
        self.mutations.push(EnvMutation {
            name: name.to_string(),
            operation,
            value,
            delim: delim.map(str::to_string),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvMutation> {
        self.mutations.iter()
    }

    /// Look up the last mutation recorded for `name`
    pub fn get(&self, name: &str) -> Option<&EnvMutation> {
        self.mutations.iter().rev().find(|m| m.name == name)
    }

    /// Write the mutation files into `dir`, creating it when needed.
    pub fn write_to(&self, dir: &Path) -> InstallerResult<()> {
        if self.is_empty() {
            return Ok(());
        }

        fs::create_dir_all(dir)
            .map_err(|e| InstallerError::io(format!("creating {}", dir.display()), e))?;

        for mutation in &self.mutations {
            let path = dir.join(format!("{}.{}", mutation.name, mutation.operation));
            fs::write(&path, &mutation.value)
                .map_err(|e| InstallerError::io(format!("writing {}", path.display()), e))?;

            if let Some(delim) = &mutation.delim {
                let path = dir.join(format!("{}.delim", mutation.name));
                fs::write(&path, delim)
                    .map_err(|e| InstallerError::io(format!("writing {}", path.display()), e))?;
            }
        }

        Ok(())
    }
}
