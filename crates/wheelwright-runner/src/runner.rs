//! CommandRunner trait: the seam between the orchestrator and real processes.
//!
//! The orchestrator never spawns anything itself. It hands fully expanded
//! [`CommandSpec`]s to a runner, which makes the build sequence testable with
//! a scripted runner and keeps process handling in one place.

use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::time::Instant;

use wheelwright_core::config::env_keys::PYTHON_CHILD_ENV;
use wheelwright_core::{BuildError, CommandSpec, Step};

/// Exit status of a finished child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub code: i32,
}

impl RunStatus {
    pub const SUCCESS: Self = Self { code: 0 };

    pub fn success(&self) -> bool {
        self.code == 0
    }
}

impl From<ExitStatus> for RunStatus {
    /// A child killed by a signal reports `128 + signal`, as a shell would.
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self { code };
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self { code: 128 + signal };
            }
        }
        Self { code: 1 }
    }
}

/// Runs commands to completion, synchronously.
pub trait CommandRunner {
    /// Run `spec` and wait for it. `Err` only when the program could not be started.
    fn run(&mut self, spec: &CommandSpec) -> Result<RunStatus, BuildError>;

    /// Resolve `program` on `PATH`.
    fn locate(&self, program: &str) -> Option<PathBuf> {
        locate_program(program)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &mut R {
    fn run(&mut self, spec: &CommandSpec) -> Result<RunStatus, BuildError> {
        (**self).run(spec)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        (**self).locate(program)
    }
}

/// Run `spec` and turn a non-zero exit into [`BuildError::CommandFailed`].
pub fn run_checked<R: CommandRunner + ?Sized>(
    runner: &mut R,
    step: Step,
    spec: &CommandSpec,
) -> Result<(), BuildError> {
    let status = runner.run(spec)?;
    if status.success() {
        Ok(())
    } else {
        tracing::error!(
            "Step {} failed with exit status {}: {}",
            step,
            status.code,
            spec.command_line()
        );
        Err(BuildError::CommandFailed {
            step,
            program: spec.program.clone(),
            code: status.code,
        })
    }
}

/// Find an executable on `PATH`.
pub fn locate_program(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

/// Spawns real processes with inherited stdio.
///
/// Every child gets `PYTHONUNBUFFERED=1` and `PYTHONDONTWRITEBYTECODE=1`
/// on top of the inherited environment.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    base_env: Vec<(String, String)>,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            base_env: PYTHON_CHILD_ENV
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_env(&self) -> &[(String, String)] {
        &self.base_env
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<RunStatus, BuildError> {
        tracing::info!("+ {}", spec.command_line());
        let started = Instant::now();

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(ref dir) = spec.cwd {
            cmd.current_dir(dir);
        }
        cmd.envs(self.base_env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        cmd.envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let status = cmd.status().map_err(|source| BuildError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        let status = RunStatus::from(status);
        tracing::debug!(
            "{} exited with {} after {:.1}s",
            spec.program,
            status.code,
            started.elapsed().as_secs_f64()
        );
        Ok(status)
    }
}
