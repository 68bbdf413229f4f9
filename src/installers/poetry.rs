//! poetry installer
//!
//! poetry is installed with `python -m pip`, using the pip from the `pip`
//! layer built earlier in the same run.

use crate::build::{BuildContext, BuildResult, CommonBuildParameters};
use crate::catalog::DependencyManager;
use crate::error::InstallerResult;
use crate::exec::{relabel, Executable, Execution};
use crate::installers::site::{site_packages_for, SitePackages};
use crate::installers::step::BuildStep;
use crate::installers::Installer;
use std::path::Path;

pub trait PoetryInstall {
    fn execute(
        &self,
        version: &str,
        layer_path: &Path,
        pip_layer_path: &Path,
    ) -> InstallerResult<()>;
}

/// `python -m pip install poetry==<version> --user`
pub struct PoetryInstallProcess {
    python: Box<dyn Executable>,
}

impl PoetryInstallProcess {
    pub fn new(python: Box<dyn Executable>) -> Self {
        Self { python }
    }
}

impl PoetryInstall for PoetryInstallProcess {
    fn execute(
        &self,
        version: &str,
        layer_path: &Path,
        pip_layer_path: &Path,
    ) -> InstallerResult<()> {
        let execution = Execution::new([
            "-m".to_string(),
            "pip".to_string(),
            "install".to_string(),
            format!("poetry=={}", version),
            "--user".to_string(),
        ])
        .env("PYTHONPATH", pip_layer_path.to_string_lossy())
        .env("PYTHONUSERBASE", layer_path.to_string_lossy());

        self.python
            .execute(&execution)
            .map(|_| ())
            .map_err(|e| relabel(e, "failed to configure poetry"))
    }
}

pub struct PoetryParameters {
    pub dependency_manager: Box<dyn DependencyManager>,
    pub install_process: Box<dyn PoetryInstall>,
    pub site_packages: Box<dyn SitePackages>,
}

impl PoetryParameters {
    pub fn build(
        &self,
        context: &BuildContext,
        common: &CommonBuildParameters,
    ) -> InstallerResult<BuildResult> {
        let step = BuildStep::new(Installer::Poetry, context, common);
        let prepared = step.prepare(self.dependency_manager.as_ref())?;

        if prepared.is_reusable() {
            let layer = step.reuse(&prepared);
            return Ok(prepared.into_result(vec![layer]));
        }

        let mut layer = step.fresh_layer(&prepared)?;
        let pip_layer = context.layers.get(Installer::Pip.layer_name())?;

        step.install(&prepared.dependency, || {
            self.install_process.execute(
                &prepared.dependency.version,
                &layer.path,
                &pip_layer.path,
            )
        })?;

        let site = site_packages_for(self.site_packages.as_ref(), Installer::Poetry, &layer.path)?;
        layer.shared_env.prepend("PYTHONPATH", site, ":");

        step.finish(&mut layer, &prepared.dependency)?;
        Ok(prepared.into_result(vec![layer]))
    }
}
