//! pipenv installer
//!
//! pipenv is installed from PyPI with the pip that is already on the path;
//! the catalog only pins the version and checksum.

use crate::build::{BuildContext, BuildResult, CommonBuildParameters};
use crate::catalog::DependencyManager;
use crate::error::InstallerResult;
use crate::exec::{relabel, Executable, Execution};
use crate::installers::site::{site_packages_for, SitePackages};
use crate::installers::step::BuildStep;
use crate::installers::Installer;
use std::path::Path;

pub trait PipenvInstall {
    fn execute(&self, version: &str, layer_path: &Path) -> InstallerResult<()>;
}

/// `pip install pipenv==<version> --user`
pub struct PipenvInstallProcess {
    pip: Box<dyn Executable>,
}

impl PipenvInstallProcess {
    pub fn new(pip: Box<dyn Executable>) -> Self {
        Self { pip }
    }
}

impl PipenvInstall for PipenvInstallProcess {
    fn execute(&self, version: &str, layer_path: &Path) -> InstallerResult<()> {
        let execution = Execution::new([
            "install".to_string(),
            format!("pipenv=={}", version),
            "--user".to_string(),
        ])
        .env("PYTHONUSERBASE", layer_path.to_string_lossy());

        self.pip
            .execute(&execution)
            .map(|_| ())
            .map_err(|e| relabel(e, "failed to configure pipenv"))
    }
}

pub struct PipenvParameters {
    pub dependency_manager: Box<dyn DependencyManager>,
    pub install_process: Box<dyn PipenvInstall>,
    pub site_packages: Box<dyn SitePackages>,
}

impl PipenvParameters {
    pub fn build(
        &self,
        context: &BuildContext,
        common: &CommonBuildParameters,
    ) -> InstallerResult<BuildResult> {
        let step = BuildStep::new(Installer::Pipenv, context, common);
        let prepared = step.prepare(self.dependency_manager.as_ref())?;

        if prepared.is_reusable() {
            let layer = step.reuse(&prepared);
            return Ok(prepared.into_result(vec![layer]));
        }

        let mut layer = step.fresh_layer(&prepared)?;
        step.install(&prepared.dependency, || {
            self.install_process
                .execute(&prepared.dependency.version, &layer.path)
        })?;

        let site = site_packages_for(self.site_packages.as_ref(), Installer::Pipenv, &layer.path)?;
        layer.shared_env.prepend("PYTHONPATH", site, ":");

        step.finish(&mut layer, &prepared.dependency)?;
        Ok(prepared.into_result(vec![layer]))
    }
}
