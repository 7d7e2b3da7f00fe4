//! Typed external-command invocation.
//!
//! Every external tool runs through [`ToolCommand`]: arguments are
//! enumerated, never spliced into a shell string, and the exit status is
//! checked on every call. Tool stdout/stderr are captured for error
//! reporting and metadata parsing.

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

use super::ToolchainError;

/// Captured result of a finished tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Builder for one external tool invocation.
#[derive(Debug)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
    envs: Vec<(String, String)>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.as_os_str().to_os_string());
        self
    }

    /// Sets an environment variable for this invocation only.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Runs the tool to completion.
    ///
    /// Fails with [`ToolchainError::Failed`] on a nonzero exit status. The
    /// invocation blocks the calling thread; the pipeline is serial by
    /// contract.
    pub fn run(self) -> Result<ToolOutput, ToolchainError> {
        self.run_with_stdin(None)
    }

    /// Runs the tool, feeding `stdin` when given (used by the coordinate
    /// transformer, which reads point pairs from standard input).
    pub fn run_with_stdin(self, stdin: Option<&str>) -> Result<ToolOutput, ToolchainError> {
        debug!(tool = %self.program, args = ?self.args, "invoking external tool");

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        if stdin.is_some() {
            command.stdin(Stdio::piped());
        } else {
            command.stdin(Stdio::null());
        }

        let mut child = command.spawn().map_err(|source| ToolchainError::Spawn {
            tool: self.program.clone(),
            source,
        })?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())
                .map_err(ToolchainError::Io)?;
            // Dropping the pipe closes stdin so the tool can finish.
        }

        let output = child.wait_with_output().map_err(ToolchainError::Io)?;
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            warn!(tool = %self.program, exit_code, stderr = %stderr.trim(), "external tool failed");
            return Err(ToolchainError::Failed {
                tool: self.program,
                exit_code,
                stderr,
            });
        }

        Ok(ToolOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}
