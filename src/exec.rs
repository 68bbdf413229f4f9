//! Subprocess execution
//!
//! Install processes shell out through [`Executable`] so tests can record
//! invocations instead of running `pip` or `bash`.

use crate::error::{InstallerError, InstallerResult};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Max number of output lines to include in failure messages.
const ERROR_TAIL_LINES: usize = 50;

/// One invocation of an executable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Execution {
    pub args: Vec<String>,

    /// Added on top of the inherited environment
    pub env: Vec<(String, String)>,

    pub dir: Option<PathBuf>,
}

impl Execution {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    /// Value of an added variable
    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Captured output of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

pub trait Executable {
    /// Run to completion; a non-zero exit is a `CommandExecution` error
    /// carrying the tail of the combined output.
    fn execute(&self, execution: &Execution) -> InstallerResult<ExecOutput>;
}

/// A program found on `PATH` or given by path
#[derive(Debug, Clone)]
pub struct SystemExecutable {
    program: String,
}

impl SystemExecutable {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command_line(&self, execution: &Execution) -> String {
        std::iter::once(self.program.as_str())
            .chain(execution.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Executable for SystemExecutable {
    fn execute(&self, execution: &Execution) -> InstallerResult<ExecOutput> {
        let command_line = self.command_line(execution);
        debug!("Running: {}", command_line);

        let mut command = Command::new(&self.program);
        command.args(&execution.args);
        command.envs(execution.env.iter().map(|(k, v)| (k, v)));
        if let Some(dir) = &execution.dir {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .map_err(|e| InstallerError::command_failed(&command_line, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let status = match output.status.code() {
                Some(code) => format!("exit status {}", code),
                None => "terminated by signal".to_string(),
            };
            return Err(InstallerError::command_exec(
                format!("{} ({})", command_line, status),
                output_tail(&stdout, &stderr),
            ));
        }

        Ok(ExecOutput { stdout, stderr })
    }
}

/// Extract the useful tail of process output for error diagnostics.
pub(crate) fn output_tail(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Re-label a failed command with an installer-specific message, keeping its output.
pub(crate) fn relabel(err: InstallerError, message: &str) -> InstallerError {
    match err {
        InstallerError::CommandExecution { command, output } => InstallerError::command_exec(
            message,
            format!("{}\nerror: {}", output, command),
        ),
        other => other,
    }
}
