//! Miniconda installer
//!
//! The catalog artifact is the Miniconda shell installer. It is delivered
//! into a scratch layer and run in batch mode against the `conda` layer.
//! With `BP_CONDA_SOLVER=mamba` the libmamba solver is installed and
//! configured afterwards.

use crate::build::{BuildContext, BuildResult, CommonBuildParameters};
use crate::catalog::DependencyManager;
use crate::config::CondaSolver;
use crate::error::InstallerResult;
use crate::exec::{relabel, Executable, Execution};
use crate::installers::step::BuildStep;
use crate::installers::Installer;
use std::path::Path;
use tracing::info;

/// Staging layer for the downloaded installer script
pub const SCRIPT_LAYER: &str = "miniconda-script-temp-layer";

/// Accept the conda channel terms of service non-interactively
const ACCEPT_TOS: &str = "CONDA_PLUGINS_AUTO_ACCEPT_TOS";

/// Runs the Miniconda installer script
pub trait ScriptRunner {
    fn run(&self, script_path: &Path, layer_path: &Path) -> InstallerResult<()>;
}

/// `bash <script> -b -f -p <layer>`
pub struct MinicondaScriptRunner {
    shell: Box<dyn Executable>,
}

impl MinicondaScriptRunner {
    pub fn new(shell: Box<dyn Executable>) -> Self {
        Self { shell }
    }
}

impl ScriptRunner for MinicondaScriptRunner {
    fn run(&self, script_path: &Path, layer_path: &Path) -> InstallerResult<()> {
        let execution = Execution::new([
            script_path.to_string_lossy().into_owned(),
            "-b".to_string(),
            "-f".to_string(),
            "-p".to_string(),
            layer_path.to_string_lossy().into_owned(),
        ]);

        self.shell
            .execute(&execution)
            .map(|_| ())
            .map_err(|e| relabel(e, "failed while running miniconda install script"))
    }
}

/// Creates the `conda` executable of an installed layer
pub type CondaFactory = Box<dyn Fn(&Path) -> Box<dyn Executable>>;

pub struct MinicondaParameters {
    pub dependency_manager: Box<dyn DependencyManager>,
    pub runner: Box<dyn ScriptRunner>,
    pub solver: CondaSolver,

    /// Given `<layer>/bin/conda`
    pub conda: CondaFactory,
}

impl MinicondaParameters {
    pub fn build(
        &self,
        context: &BuildContext,
        common: &CommonBuildParameters,
    ) -> InstallerResult<BuildResult> {
        let step = BuildStep::new(Installer::Miniconda, context, common);
        let prepared = step.prepare(self.dependency_manager.as_ref())?;

        if prepared.is_reusable() {
            let layer = step.reuse(&prepared);
            return Ok(prepared.into_result(vec![layer]));
        }

        let mut layer = step.fresh_layer(&prepared)?;
        let scratch = step.scratch_layer(SCRIPT_LAYER)?;

        step.install(&prepared.dependency, || {
            self.dependency_manager.deliver(
                &prepared.dependency,
                &context.cnb_path,
                &scratch.path,
                &context.platform_path,
            )?;
            let script = scratch.path.join(prepared.dependency.artifact_name());
            self.runner.run(&script, &layer.path)
        })?;

        if self.solver == CondaSolver::Mamba {
            self.configure_mamba(&step, &layer.path)?;
        }

        layer.shared_env.append(ACCEPT_TOS, "true", ":");
        step.finish(&mut layer, &prepared.dependency)?;
        Ok(prepared.into_result(vec![layer]))
    }

    fn configure_mamba(&self, step: &BuildStep<'_>, layer_path: &Path) -> InstallerResult<()> {
        let conda = (self.conda)(&layer_path.join("bin").join("conda"));

        info!("  Installing mamba solver");
        step.timed("Solver", || {
            let execution = Execution::new(["install", "-n", "base", "conda-libmamba-solver", "-y"])
                .env(ACCEPT_TOS, "true");
            conda
                .execute(&execution)
                .map(|_| ())
                .map_err(|e| relabel(e, "failed to setup solver"))
        })?;

        info!("  Configuring mamba solver");
        step.timed("Configuration", || {
            conda
                .execute(&Execution::new(["config", "--set", "solver", "libmamba"]))
                .map(|_| ())
        })
    }
}
