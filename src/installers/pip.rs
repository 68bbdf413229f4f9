//! pip installer
//!
//! The pip distribution is delivered into a `pip-source` layer and installed
//! from there with `--no-index`, so later `pip install` runs can find it again
//! through `PIP_FIND_LINKS`. Both layers are part of the result.

use crate::build::{BuildContext, BuildResult, CommonBuildParameters};
use crate::catalog::DependencyManager;
use crate::error::InstallerResult;
use crate::exec::{relabel, Executable, Execution};
use crate::installers::site::{site_packages_for, SitePackages};
use crate::installers::step::BuildStep;
use crate::installers::Installer;
use crate::layer::Layer;
use std::path::Path;

/// Layer holding the downloaded pip distribution
pub const SOURCE_LAYER: &str = "pip-source";

/// Installs pip from a local source directory into a layer
pub trait PipInstall {
    fn execute(&self, source_path: &Path, layer_path: &Path) -> InstallerResult<()>;
}

/// `python -m pip install <src> --user --no-index --find-links=<src>`
pub struct PipInstallProcess {
    python: Box<dyn Executable>,
}

impl PipInstallProcess {
    pub fn new(python: Box<dyn Executable>) -> Self {
        Self { python }
    }
}

impl PipInstall for PipInstallProcess {
    fn execute(&self, source_path: &Path, layer_path: &Path) -> InstallerResult<()> {
        let source = source_path.to_string_lossy();
        let execution = Execution::new([
            "-m".to_string(),
            "pip".to_string(),
            "install".to_string(),
            source.to_string(),
            "--user".to_string(),
            "--no-index".to_string(),
            format!("--find-links={}", source),
        ])
        .env("PYTHONUSERBASE", layer_path.to_string_lossy());

        self.python
            .execute(&execution)
            .map(|_| ())
            .map_err(|e| relabel(e, "failed to configure pip"))
    }
}

pub struct PipParameters {
    pub dependency_manager: Box<dyn DependencyManager>,
    pub install_process: Box<dyn PipInstall>,
    pub site_packages: Box<dyn SitePackages>,
}

impl PipParameters {
    pub fn build(
        &self,
        context: &BuildContext,
        common: &CommonBuildParameters,
    ) -> InstallerResult<BuildResult> {
        let step = BuildStep::new(Installer::Pip, context, common);
        let prepared = step.prepare(self.dependency_manager.as_ref())?;

        if prepared.is_reusable() {
            let pip = step.reuse(&prepared);
            let mut source = context.layers.get(SOURCE_LAYER)?;
            configure_source(&mut source, prepared.types.build);
            return Ok(prepared.into_result(vec![pip, source]));
        }

        let mut pip = step.fresh_layer(&prepared)?;
        let mut source = context.layers.get(SOURCE_LAYER)?.reset()?;
        configure_source(&mut source, prepared.types.build);

        step.install(&prepared.dependency, || {
            self.dependency_manager.deliver(
                &prepared.dependency,
                &context.cnb_path,
                &source.path,
                &context.platform_path,
            )?;
            self.install_process.execute(&source.path, &pip.path)
        })?;

        let site = site_packages_for(self.site_packages.as_ref(), Installer::Pip, &pip.path)?;
        pip.shared_env.prepend("PYTHONPATH", site, ":");

        step.finish(&mut pip, &prepared.dependency)?;
        Ok(prepared.into_result(vec![pip, source]))
    }
}

/// The source layer follows pip into the build environment but never ships.
fn configure_source(source: &mut Layer, build: bool) {
    source.build = build;
    source.cache = build;
    source.launch = false;
    source.build_env = Default::default();
    source
        .build_env
        .append("PIP_FIND_LINKS", source.path.to_string_lossy(), " ");
}
