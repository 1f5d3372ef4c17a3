//! Capabilities the dispatcher needs from the outside world.
//!
//! Each capability is a trait with one production implementation here and
//! recording fakes under `testing` for unit tests.

use itertools::Itertools;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde::Serialize;
use std::env;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A program and its arguments, ready to hand to a [`CommandRunner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            f.write_str(&self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.iter().join(" "))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub success: bool,
    pub code: Option<i32>,
}

impl RunStatus {
    pub const SUCCESS: RunStatus = RunStatus {
        success: true,
        code: Some(0),
    };
}

/// The execution boundary.
pub trait CommandRunner {
    fn run(&self, command: &CommandLine, cwd: &Path) -> io::Result<RunStatus>;
}

/// Reports the version string a manager prints for `--version`.
pub trait VersionReporter {
    fn version(&self, program: &str, cwd: &Path) -> io::Result<String>;
}

/// Blocking single-line prompt. `Ok(None)` means the user cancelled.
pub trait TextInput {
    fn read_line(&self, prompt: &str) -> io::Result<Option<String>>;
}

/// Resolve `program` on PATH relative to `cwd`, keeping the bare name when it cannot be found
/// so the OS reports the failure.
fn resolve_program(program: &str, cwd: &Path) -> PathBuf {
    which::which_in(program, env::var_os("PATH"), cwd).unwrap_or_else(|_| PathBuf::from(program))
}

/// Spawns commands as child processes sharing this process's stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    #[tracing::instrument(skip(self, command), fields(command = %command))]
    fn run(&self, command: &CommandLine, cwd: &Path) -> io::Result<RunStatus> {
        let status = Command::new(resolve_program(&command.program, cwd))
            .args(&command.args)
            .current_dir(cwd)
            .status()?;
        tracing::debug!(?status, "command finished");
        Ok(RunStatus {
            success: status.success(),
            code: status.code(),
        })
    }
}

/// Runs `<program> --version` and returns its trimmed stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessVersionReporter;

impl VersionReporter for ProcessVersionReporter {
    #[tracing::instrument(skip(self))]
    fn version(&self, program: &str, cwd: &Path) -> io::Result<String> {
        let output = Command::new(resolve_program(program, cwd))
            .arg("--version")
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(io::Error::other(format!(
                "`{program} --version` exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Line editor backed prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalInput;

impl TextInput for TerminalInput {
    fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        let mut editor = DefaultEditor::new().map_err(io::Error::other)?;
        match editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Io(e)) => Err(e),
            Err(e) => Err(io::Error::other(e)),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Records every command instead of running it.
    #[derive(Debug)]
    pub struct RecordingRunner {
        pub status: RunStatus,
        pub calls: RefCell<Vec<(CommandLine, PathBuf)>>,
    }

    impl RecordingRunner {
        pub fn succeeding() -> Self {
            Self::with_status(RunStatus::SUCCESS)
        }

        pub fn with_status(status: RunStatus) -> Self {
            Self {
                status,
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn commands(&self) -> Vec<CommandLine> {
            self.calls.borrow().iter().map(|(c, _)| c.clone()).collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command: &CommandLine, cwd: &Path) -> io::Result<RunStatus> {
            self.calls
                .borrow_mut()
                .push((command.clone(), cwd.to_path_buf()));
            Ok(self.status)
        }
    }

    /// Answers every version query with the same string, or fails when `None`.
    #[derive(Debug, Default)]
    pub struct FixedVersion {
        pub version: Option<String>,
        pub queries: Cell<usize>,
    }

    impl FixedVersion {
        pub fn reporting(version: &str) -> Self {
            Self {
                version: Some(version.to_string()),
                queries: Cell::new(0),
            }
        }

        pub fn failing() -> Self {
            Self::default()
        }
    }

    impl VersionReporter for FixedVersion {
        fn version(&self, program: &str, _cwd: &Path) -> io::Result<String> {
            self.queries.set(self.queries.get() + 1);
            self.version.clone().ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("{program} not installed"))
            })
        }
    }

    /// Replies with a canned line and counts prompts.
    #[derive(Debug, Default)]
    pub struct ScriptedInput {
        pub reply: Option<String>,
        pub prompts: Cell<usize>,
    }

    impl ScriptedInput {
        pub fn replying(line: &str) -> Self {
            Self {
                reply: Some(line.to_string()),
                prompts: Cell::new(0),
            }
        }
    }

    impl TextInput for ScriptedInput {
        fn read_line(&self, _prompt: &str) -> io::Result<Option<String>> {
            self.prompts.set(self.prompts.get() + 1);
            Ok(self.reply.clone())
        }
    }
}
