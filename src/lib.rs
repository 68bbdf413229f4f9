//! python-installers - Python package managers as buildpack layers
//!
//! Resolves a version for each tool the build plan asks for, reuses or
//! rebuilds its layer, and reports the layers with their bills of materials.

pub mod build;
pub mod cache;
pub mod catalog;
pub mod checksum;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod exec;
pub mod installers;
pub mod layer;
pub mod orchestration;
pub mod plan;
pub mod planner;
pub mod sbom;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{InstallerError, InstallerResult};
