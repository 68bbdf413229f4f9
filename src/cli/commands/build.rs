//! Build command - install the planned tools and persist the layers

use crate::build::BuildContext;
use crate::cli::args::BuildArgs;
use crate::config::{BuildSettings, ConfigManager};
use crate::error::{InstallerError, InstallerResult};
use crate::layer::Layers;
use crate::orchestration::{create_common_parameters, create_parameters, run};
use crate::plan::Plan;
use console::style;
use std::fs;
use tracing::debug;

/// Execute the build command
pub fn execute(args: BuildArgs, settings: &BuildSettings) -> InstallerResult<()> {
    let config = ConfigManager::for_buildpack(&args.buildpack_dir).load()?;
    let plan = Plan::load(&args.plan)?.with_env_overrides();
    debug!("Plan entries: {:?}", plan.names());

    fs::create_dir_all(&args.layers).map_err(|e| {
        InstallerError::io(format!("creating layers directory {}", args.layers.display()), e)
    })?;

    let context = BuildContext {
        buildpack: config.buildpack,
        cnb_path: args.buildpack_dir,
        platform_path: args.platform,
        layers: Layers::new(args.layers),
        plan,
        stack: args.stack,
    };

    let parameters = create_parameters(settings);
    let result = run(&context, &parameters, &create_common_parameters())?;
    context.layers.persist(&result)?;

    println!(
        "{} Built {} layer(s) in {}",
        style("✓").green(),
        result.layers.len(),
        style(context.layers.path().display()).cyan()
    );
    Ok(())
}
