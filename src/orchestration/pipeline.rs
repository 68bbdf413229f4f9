//! Ordered multi-installer pipeline

use crate::build::{BuildContext, BuildResult, CommonBuildParameters};
use crate::error::{InstallerError, InstallerResult};
use crate::installers::miniconda::MinicondaParameters;
use crate::installers::pip::PipParameters;
use crate::installers::pipenv::PipenvParameters;
use crate::installers::pixi::PixiParameters;
use crate::installers::poetry::PoetryParameters;
use crate::installers::uv::UvParameters;
use crate::installers::Installer;
use std::collections::HashSet;
use tracing::{debug, info};

/// Per-installer collaborators; an installer the plan needs must be present.
#[derive(Default)]
pub struct InstallerParameters {
    pub pip: Option<PipParameters>,
    pub pipenv: Option<PipenvParameters>,
    pub poetry: Option<PoetryParameters>,
    pub miniconda: Option<MinicondaParameters>,
    pub uv: Option<UvParameters>,
    pub pixi: Option<PixiParameters>,
}

impl InstallerParameters {
    fn build(
        &self,
        installer: Installer,
        context: &BuildContext,
        common: &CommonBuildParameters,
    ) -> InstallerResult<BuildResult> {
        let missing = || InstallerError::MissingParameters(installer.plan_name().to_string());
        match installer {
            Installer::Pip => self.pip.as_ref().ok_or_else(missing)?.build(context, common),
            Installer::Pipenv => self.pipenv.as_ref().ok_or_else(missing)?.build(context, common),
            Installer::Poetry => self.poetry.as_ref().ok_or_else(missing)?.build(context, common),
            Installer::Miniconda => self
                .miniconda
                .as_ref()
                .ok_or_else(missing)?
                .build(context, common),
            Installer::Uv => self.uv.as_ref().ok_or_else(missing)?.build(context, common),
            Installer::Pixi => self.pixi.as_ref().ok_or_else(missing)?.build(context, common),
        }
    }
}

/// Build every installer the plan asks for, in priority order.
///
/// The first failing installer aborts the run; nothing built so far is returned.
pub fn run(
    context: &BuildContext,
    parameters: &InstallerParameters,
    common: &CommonBuildParameters,
) -> InstallerResult<BuildResult> {
    info!("{} {}", context.buildpack.name, context.buildpack.version);

    if context.plan.is_empty() {
        return Err(InstallerError::EmptyPlan);
    }

    let requested = context
        .plan
        .names()
        .into_iter()
        .map(str::parse::<Installer>)
        .collect::<InstallerResult<HashSet<Installer>>>()?;

    let mut result = BuildResult::default();
    for installer in Installer::PRIORITY_ORDER {
        if !requested.contains(&installer) {
            continue;
        }
        debug!("Dispatching {}", installer);

        let partial = parameters
            .build(installer, context, common)
            .map_err(|e| e.in_step(installer.plan_name()))?;
        result.extend(partial);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::SystemExecutable;
    use crate::installers::pip::PipInstallProcess;
    use crate::installers::pipenv::PipenvInstallProcess;
    use crate::installers::poetry::PoetryInstallProcess;
    use crate::installers::site::SitePackageProcess;
    use crate::installers::uv::UvInstallProcess;
    use crate::plan::PlanEntry;
    use crate::testing::{
        build_context, common_parameters, descriptor, FakeDependencyManager, RecordingExecutable,
    };
    use tempfile::TempDir;

    fn site(answer: &str) -> Box<SitePackageProcess> {
        let python = RecordingExecutable::new();
        python.respond_with(answer);
        Box::new(SitePackageProcess::new(Box::new(python)))
    }

    fn pip(manager: &FakeDependencyManager) -> PipParameters {
        PipParameters {
            dependency_manager: Box::new(manager.clone()),
            install_process: Box::new(PipInstallProcess::new(Box::new(RecordingExecutable::new()))),
            site_packages: site("/layers/pip/lib/python3.12/site-packages\n"),
        }
    }

    fn pipenv(manager: &FakeDependencyManager) -> PipenvParameters {
        PipenvParameters {
            dependency_manager: Box::new(manager.clone()),
            install_process: Box::new(PipenvInstallProcess::new(Box::new(
                RecordingExecutable::new(),
            ))),
            site_packages: site("/layers/pipenv/lib/python3.12/site-packages\n"),
        }
    }

    fn layer_names(result: &BuildResult) -> Vec<&str> {
        result.layers.iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn layers_follow_priority_order() {
        let temp = TempDir::new().unwrap();
        let context = build_context(
            temp.path(),
            vec![PlanEntry::named("pipenv"), PlanEntry::named("pip"), PlanEntry::named("pipenv")],
        );
        let pip_catalog = FakeDependencyManager::returning(descriptor("pip", "24.0", "sha256:aaa"));
        let pipenv_catalog =
            FakeDependencyManager::returning(descriptor("pipenv", "2024.0.1", "sha256:bbb"));
        let parameters = InstallerParameters {
            pip: Some(pip(&pip_catalog)),
            pipenv: Some(pipenv(&pipenv_catalog)),
            ..Default::default()
        };

        let result = run(&context, &parameters, &common_parameters()).unwrap();

        assert_eq!(layer_names(&result), vec!["pip", "pip-source", "pipenv"]);
        assert_eq!(pipenv_catalog.resolve_calls().len(), 1);
    }

    #[test]
    fn empty_plan_is_rejected() {
        let temp = TempDir::new().unwrap();
        let context = build_context(temp.path(), Vec::new());

        let err = run(&context, &InstallerParameters::default(), &common_parameters()).unwrap_err();
        assert!(matches!(err, InstallerError::EmptyPlan));
        assert_eq!(err.to_string(), "empty plan should not happen");
    }

    #[test]
    fn unknown_entry_is_rejected_before_building() {
        let temp = TempDir::new().unwrap();
        let context = build_context(
            temp.path(),
            vec![PlanEntry::named("pip"), PlanEntry::named("cpython")],
        );
        let catalog = FakeDependencyManager::returning(descriptor("pip", "24.0", "sha256:aaa"));
        let parameters = InstallerParameters {
            pip: Some(pip(&catalog)),
            ..Default::default()
        };

        let err = run(&context, &parameters, &common_parameters()).unwrap_err();
        assert_eq!(err.to_string(), "unknown plan: cpython");
        assert!(catalog.resolve_calls().is_empty());
    }

    #[test]
    fn missing_parameters_name_the_tool() {
        let temp = TempDir::new().unwrap();
        let context = build_context(temp.path(), vec![PlanEntry::named("conda")]);

        let err = run(&context, &InstallerParameters::default(), &common_parameters()).unwrap_err();
        assert!(matches!(err, InstallerError::MissingParameters(ref name) if name == "conda"));
        assert_eq!(err.to_string(), "missing plan for: conda");
    }

    #[test]
    fn first_failure_stops_the_run() {
        let temp = TempDir::new().unwrap();
        let context = build_context(
            temp.path(),
            vec![
                PlanEntry::named("uv"),
                PlanEntry::named("poetry"),
                PlanEntry::named("pipenv"),
                PlanEntry::named("pip"),
            ],
        );
        let pip_catalog = FakeDependencyManager::returning(descriptor("pip", "24.0", "sha256:aaa"));
        let pipenv_catalog =
            FakeDependencyManager::returning(descriptor("pipenv", "2024.0.1", "sha256:bbb"));
        let poetry_catalog =
            FakeDependencyManager::returning(descriptor("poetry", "1.8.3", "sha256:ccc"));
        let uv_catalog = FakeDependencyManager::returning(descriptor("uv", "0.5.1", "sha256:ddd"));

        let python = RecordingExecutable::new();
        python.fail_with(
            "python -m pip install poetry==1.8.3 (exit status 1)",
            "No matching distribution",
        );
        let parameters = InstallerParameters {
            pip: Some(pip(&pip_catalog)),
            pipenv: Some(pipenv(&pipenv_catalog)),
            poetry: Some(PoetryParameters {
                dependency_manager: Box::new(poetry_catalog.clone()),
                install_process: Box::new(PoetryInstallProcess::new(Box::new(python))),
                site_packages: site("/layers/poetry/site-packages\n"),
            }),
            uv: Some(UvParameters {
                dependency_manager: Box::new(uv_catalog.clone()),
                install_process: Box::new(UvInstallProcess),
                arch: "amd64".to_string(),
            }),
            ..Default::default()
        };

        let err = run(&context, &parameters, &common_parameters()).unwrap_err();

        assert!(matches!(err, InstallerError::Step { ref installer, .. } if installer == "poetry"));
        assert!(err.to_string().starts_with("poetry: failed to configure poetry"));
        assert!(uv_catalog.resolve_calls().is_empty());
        assert!(uv_catalog.deliver_calls().is_empty());
    }

    #[test]
    fn resolution_errors_are_not_wrapped() {
        let temp = TempDir::new().unwrap();
        let context = build_context(temp.path(), vec![PlanEntry::named("pip")]);
        let parameters = InstallerParameters {
            pip: Some(PipParameters {
                dependency_manager: Box::new(FakeDependencyManager::failing_resolve()),
                install_process: Box::new(PipInstallProcess::new(Box::new(
                    SystemExecutable::new("python"),
                ))),
                site_packages: site(""),
            }),
            ..Default::default()
        };

        let err = run(&context, &parameters, &common_parameters()).unwrap_err();
        assert!(matches!(err, InstallerError::DependencyNotFound { .. }));
    }
}
