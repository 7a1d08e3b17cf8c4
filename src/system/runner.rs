//! Blocking subprocess execution.
//!
//! Every interaction with the operating system's service manager, the driver
//! installer and the registry goes through a [`CommandRunner`], so the whole
//! provisioning flow can be replayed against a scripted runner in tests.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{Result, SetupError};

/// One external program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Bare program name without directory or extension (`sc`, `reg`, `PawnIO_setup`)
    pub fn program_name(&self) -> String {
        self.program
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(' ') && !arg.starts_with('"') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Exit code and captured stdout of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Raw exit code; -1 when the process ended without one
    pub code: i32,
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Launches a program, blocks until it exits and returns its exit code.
///
/// An `Err` means the program could not be started at all. A program that
/// ran and failed is an `Ok` with a nonzero code.
pub trait CommandRunner {
    fn execute(&self, invocation: &Invocation) -> Result<CommandOutput>;

    fn status(&self, invocation: &Invocation) -> Result<i32> {
        self.execute(invocation).map(|output| output.code)
    }
}

/// Runs commands on the host with `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn execute(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let program = resolve_program(&invocation.program);
        debug!("exec: {invocation}");

        let output = Command::new(&program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| SetupError::Spawn {
                program: invocation.program.display().to_string(),
                source,
            })?;

        let code = output.status.code().unwrap_or(-1);
        debug!("exit {code}: {}", invocation.program_name());

        Ok(CommandOutput {
            code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Bare command names are looked up on PATH; anything with a directory is used as is
fn resolve_program(program: &Path) -> PathBuf {
    if program.components().count() > 1 {
        return program.to_path_buf();
    }
    which::which(program).unwrap_or_else(|_| program.to_path_buf())
}
