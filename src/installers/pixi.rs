//! pixi installer

use crate::build::{BuildContext, BuildResult, CommonBuildParameters};
use crate::catalog::DependencyManager;
use crate::error::InstallerResult;
use crate::installers::binary::{copy_tree, translate_arch, BinaryInstall};
use crate::installers::step::BuildStep;
use crate::installers::Installer;
use std::path::Path;

pub const SCRATCH_LAYER: &str = "pixi-temp-layer";

/// The pixi release archive holds the bare executable; everything is copied.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixiInstallProcess;

impl BinaryInstall for PixiInstallProcess {
    fn execute(&self, layer_path: &Path, source_path: &Path, arch: &str) -> InstallerResult<()> {
        translate_arch(arch)?;
        copy_tree(source_path, &layer_path.join("bin"))
    }
}

pub struct PixiParameters {
    pub dependency_manager: Box<dyn DependencyManager>,
    pub install_process: Box<dyn BinaryInstall>,

    /// Used when the catalog entry carries no architecture
    pub arch: String,
}

impl PixiParameters {
    pub fn build(
        &self,
        context: &BuildContext,
        common: &CommonBuildParameters,
    ) -> InstallerResult<BuildResult> {
        let step = BuildStep::new(Installer::Pixi, context, common);
        let prepared = step.prepare(self.dependency_manager.as_ref())?;

        if prepared.is_reusable() {
            let layer = step.reuse(&prepared);
            return Ok(prepared.into_result(vec![layer]));
        }

        let mut layer = step.fresh_layer(&prepared)?;
        let scratch = step.scratch_layer(SCRATCH_LAYER)?;
        let dependency = &prepared.dependency;
        let arch = match dependency.arch.as_str() {
            "" => self.arch.as_str(),
            arch => arch,
        };

        step.install(dependency, || {
            self.dependency_manager.deliver(
                dependency,
                &context.cnb_path,
                &scratch.path,
                &context.platform_path,
            )?;
            self.install_process.execute(&layer.path, &scratch.path, arch)
        })?;

        step.finish(&mut layer, dependency)?;
        Ok(prepared.into_result(vec![layer]))
    }
}
