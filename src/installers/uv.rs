//! uv installer

use crate::build::{BuildContext, BuildResult, CommonBuildParameters};
use crate::catalog::DependencyManager;
use crate::error::InstallerResult;
use crate::installers::binary::{copy_tree, translate_arch, BinaryInstall};
use crate::installers::step::BuildStep;
use crate::installers::Installer;
use std::path::Path;

pub const SCRATCH_LAYER: &str = "uv-temp-layer";

/// Copies `uv-<triple>-unknown-linux-gnu/*` from the unpacked release
#[derive(Debug, Clone, Copy, Default)]
pub struct UvInstallProcess;

impl BinaryInstall for UvInstallProcess {
    fn execute(&self, layer_path: &Path, source_path: &Path, arch: &str) -> InstallerResult<()> {
        let triple = translate_arch(arch)?;
        let folder = format!("uv-{}-unknown-linux-gnu", triple);
        copy_tree(&source_path.join(folder), &layer_path.join("bin"))
    }
}

pub struct UvParameters {
    pub dependency_manager: Box<dyn DependencyManager>,
    pub install_process: Box<dyn BinaryInstall>,

    /// Used when the catalog entry carries no architecture
    pub arch: String,
}

impl UvParameters {
    pub fn build(
        &self,
        context: &BuildContext,
        common: &CommonBuildParameters,
    ) -> InstallerResult<BuildResult> {
        let step = BuildStep::new(Installer::Uv, context, common);
        let prepared = step.prepare(self.dependency_manager.as_ref())?;

        if prepared.is_reusable() {
            let layer = step.reuse(&prepared);
            return Ok(prepared.into_result(vec![layer]));
        }

        let mut layer = step.fresh_layer(&prepared)?;
        let scratch = step.scratch_layer(SCRATCH_LAYER)?;
        let dependency = &prepared.dependency;
        let arch = if dependency.arch.is_empty() {
            self.arch.as_str()
        } else {
            dependency.arch.as_str()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Checksum;
    use crate::error::InstallerError;
    use crate::layer::LayerMetadata;
    use crate::plan::PlanEntry;
    use crate::testing::{build_context, common_parameters, descriptor, FakeDependencyManager};
    use std::fs;
    use tempfile::TempDir;

    fn parameters(manager: &FakeDependencyManager) -> UvParameters {
        UvParameters {
            dependency_manager: Box::new(manager.clone()),
            install_process: Box::new(UvInstallProcess),
            arch: "amd64".to_string(),
        }
    }

    #[test]
    fn installs_uv_binaries() {
        let temp = TempDir::new().unwrap();
        let context =
            build_context(temp.path(), vec![PlanEntry::named("uv").with_flags(true, true)]);
        let manager = FakeDependencyManager::returning(descriptor("uv", "0.5.1", "sha256:abc"));
        manager.deliver_file("uv-x86_64-unknown-linux-gnu/uv", "uv");
        manager.deliver_file("uv-x86_64-unknown-linux-gnu/uvx", "uvx");

        let result = parameters(&manager).build(&context, &common_parameters()).unwrap();

        let layer = &result.layers[0];
        assert_eq!(layer.name, "uv");
        assert!(layer.build && layer.launch && layer.cache);
        assert_eq!(fs::read_to_string(layer.path.join("bin/uv")).unwrap(), "uv");
        assert_eq!(fs::read_to_string(layer.path.join("bin/uvx")).unwrap(), "uvx");
        assert_eq!(
            manager.deliver_calls()[0].destination,
            context.layers.path().join(SCRATCH_LAYER)
        );
        assert_eq!(
            layer.metadata.checksum("dependency-sha"),
            Some(&Checksum::parse("sha256:abc"))
        );
    }

    #[test]
    fn descriptor_arch_wins() {
        let temp = TempDir::new().unwrap();
        let context = build_context(temp.path(), vec![PlanEntry::named("uv")]);
        let mut dependency = descriptor("uv", "0.5.1", "sha256:abc");
        dependency.arch = "arm64".to_string();
        let manager = FakeDependencyManager::returning(dependency);
        manager.deliver_file("uv-aarch64-unknown-linux-gnu/uv", "uv");

        let result = parameters(&manager).build(&context, &common_parameters()).unwrap();
        assert!(result.layers[0].path.join("bin/uv").is_file());
    }

    #[test]
    fn unsupported_arch_fails() {
        let temp = TempDir::new().unwrap();
        let context = build_context(temp.path(), vec![PlanEntry::named("uv")]);
        let manager = FakeDependencyManager::returning(descriptor("uv", "0.5.1", "sha256:abc"));
        let params = UvParameters {
            arch: "s390x".to_string(),
            ..parameters(&manager)
        };

        let err = params.build(&context, &common_parameters()).unwrap_err();
        assert!(matches!(err, InstallerError::UnsupportedArch(ref arch) if arch == "s390x"));
    }

    #[test]
    fn reuse_skips_delivery() {
        let temp = TempDir::new().unwrap();
        let context = build_context(temp.path(), vec![PlanEntry::named("uv")]);
        let mut cached = context.layers.get("uv").unwrap();
        cached.metadata = LayerMetadata::installed(
            "dependency-sha",
            Checksum::parse("sha256:abc"),
            common_parameters().clock.now(),
        );
        context.layers.write(&cached).unwrap();

        let manager = FakeDependencyManager::returning(descriptor("uv", "0.5.1", "sha256:abc"));
        let result = parameters(&manager).build(&context, &common_parameters()).unwrap();

        assert_eq!(result.layers.len(), 1);
        assert!(manager.deliver_calls().is_empty());
        assert!(!context.layers.path().join(SCRATCH_LAYER).exists());
    }
}
