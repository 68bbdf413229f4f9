//! python-installers - buildpack build entry point
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use python_installers::cli::{Cli, Commands, LogFormat};
use python_installers::config::BuildSettings;
use python_installers::error::InstallerResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> InstallerResult<()> {
    let cli = Cli::parse();
    let settings = BuildSettings::from_env();

    // Buildpack progress is logged at info; -v or BP_LOG_LEVEL=DEBUG adds internals
    let filter = if cli.verbose > 0 || settings.debug {
        EnvFilter::new("python_installers=debug")
    } else {
        EnvFilter::new("python_installers=info")
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time();
    match cli.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    match cli.command {
        Commands::Build(args) => python_installers::cli::commands::build(args, &settings),
    }
}
