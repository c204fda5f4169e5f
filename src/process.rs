use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

/// One external tool invocation: a program, its argv, and the directory it
/// runs in.
///
/// The working directory is always explicit. The installer never changes its
/// own current directory mid-flow; each child gets the directory it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl CommandSpec {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
        cwd: impl Into<PathBuf>,
    ) -> Self {
        CommandSpec {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.into(),
        }
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.chars().any(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: CommandSpec,
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}", exit_label(.code))]
    Failed {
        command: CommandSpec,
        code: Option<i32>,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "a signal".to_string(),
    }
}

/// Seam between the install flow and the operating system.
///
/// The flow is written against this trait so tests can script every composer,
/// artisan, and npm invocation without a PHP toolchain on the machine.
pub trait ProcessRunner {
    /// Run to completion; non-zero exit is an error.
    fn run(&mut self, spec: &CommandSpec) -> Result<(), ProcessError>;
}

/// Real runner: spawns the child with inherited stdio and blocks until exit.
///
/// Inherited stdio is load-bearing here. Composer progress bars, artisan
/// confirmation prompts, and npm output all talk to the operator's terminal
/// directly, so the child streams are never captured.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<(), ProcessError> {
        let status = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .status()
            .map_err(|source| ProcessError::Spawn {
                command: spec.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ProcessError::Failed {
                command: spec.clone(),
                code: status.code(),
            });
        }

        Ok(())
    }
}

/// Scripted runner for tests and rehearsals: records every command instead of
/// spawning it, optionally reporting failure for one program name.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub commands: Vec<CommandSpec>,
    pub fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        RecordingRunner::default()
    }

    pub fn failing_on(program: impl Into<String>) -> Self {
        RecordingRunner {
            commands: Vec::new(),
            fail_on: Some(program.into()),
        }
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<(), ProcessError> {
        self.commands.push(spec.clone());
        if self.fail_on.as_deref() == Some(spec.program.as_str()) {
            return Err(ProcessError::Failed {
                command: spec.clone(),
                code: Some(1),
            });
        }
        Ok(())
    }
}
