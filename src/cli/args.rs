//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Python installers buildpack
///
/// Installs pip, pipenv, poetry, miniconda, uv and pixi into cacheable
/// build layers according to a build plan.
#[derive(Parser, Debug)]
#[command(name = "python-installers")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the tools requested by a build plan
    Build(BuildArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Layers directory
    pub layers: PathBuf,

    /// Platform directory (bindings)
    pub platform: PathBuf,

    /// Build plan file (TOML)
    pub plan: PathBuf,

    /// Buildpack directory holding buildpack.toml
    #[arg(long, env = "CNB_BUILDPACK_DIR", default_value = ".")]
    pub buildpack_dir: PathBuf,

    /// Stack id used to filter catalog dependencies
    #[arg(long, env = "CNB_STACK_ID", default_value = "io.buildpacks.stacks.jammy")]
    pub stack: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}
