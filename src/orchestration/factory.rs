//! Wiring of the real collaborators
//!
//! Installers shell out to whatever `python`, `pip` and `bash` the build
//! image puts on `PATH`, and fetch artifacts through the buildpack catalog.

use crate::build::CommonBuildParameters;
use crate::catalog::CatalogService;
use crate::clock::Clock;
use crate::config::BuildSettings;
use crate::exec::{Executable, SystemExecutable};
use crate::installers::miniconda::{MinicondaParameters, MinicondaScriptRunner};
use crate::installers::pip::{PipInstallProcess, PipParameters};
use crate::installers::pipenv::{PipenvInstallProcess, PipenvParameters};
use crate::installers::pixi::{PixiInstallProcess, PixiParameters};
use crate::installers::poetry::{PoetryInstallProcess, PoetryParameters};
use crate::installers::site::SitePackageProcess;
use crate::installers::uv::{UvInstallProcess, UvParameters};
use crate::orchestration::pipeline::InstallerParameters;
use crate::sbom::DependencySbomGenerator;
use std::path::Path;

fn python() -> Box<dyn Executable> {
    Box::new(SystemExecutable::new("python"))
}

fn catalog(settings: &BuildSettings) -> Box<CatalogService> {
    Box::new(CatalogService::new(settings.arch.clone()))
}

/// Parameters for all six installers
pub fn create_parameters(settings: &BuildSettings) -> InstallerParameters {
    InstallerParameters {
        pip: Some(PipParameters {
            dependency_manager: catalog(settings),
            install_process: Box::new(PipInstallProcess::new(python())),
            site_packages: Box::new(SitePackageProcess::new(python())),
        }),
        pipenv: Some(PipenvParameters {
            dependency_manager: catalog(settings),
            install_process: Box::new(PipenvInstallProcess::new(Box::new(SystemExecutable::new(
                "pip",
            )))),
            site_packages: Box::new(SitePackageProcess::new(python())),
        }),
        poetry: Some(PoetryParameters {
            dependency_manager: catalog(settings),
            install_process: Box::new(PoetryInstallProcess::new(python())),
            site_packages: Box::new(SitePackageProcess::new(python())),
        }),
        miniconda: Some(MinicondaParameters {
            dependency_manager: catalog(settings),
            runner: Box::new(MinicondaScriptRunner::new(Box::new(SystemExecutable::new(
                "bash",
            )))),
            solver: settings.conda_solver,
            conda: Box::new(|path: &Path| -> Box<dyn Executable> {
                Box::new(SystemExecutable::new(path.to_string_lossy()))
            }),
        }),
        uv: Some(UvParameters {
            dependency_manager: catalog(settings),
            install_process: Box::new(UvInstallProcess),
            arch: settings.arch.clone(),
        }),
        pixi: Some(PixiParameters {
            dependency_manager: catalog(settings),
            install_process: Box::new(PixiInstallProcess),
            arch: settings.arch.clone(),
        }),
    }
}

pub fn create_common_parameters() -> CommonBuildParameters {
    CommonBuildParameters {
        sbom_generator: Box::new(DependencySbomGenerator),
        clock: Clock::System,
    }
}
