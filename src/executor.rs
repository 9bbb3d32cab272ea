//! Runs approved commands through the system shell.
//!
//! Execution never fails from the caller's point of view: a non-zero exit or
//! a shell that cannot be spawned both come back as descriptive text, which
//! the workflow shows to the user and may feed back into the conversation.

use anyhow::{Result, anyhow};
use std::process::{Command, Output};
use tracing::{error, info};

/// Prefix of every failure report.
pub const EXECUTION_ERROR_PREFIX: &str = "Error executing command:";

// =============================================================================
// Traits for Dependency Injection
// =============================================================================

/// Trait for running system processes.
///
/// This abstraction enables testing without spawning real processes.
pub trait ProcessRunner: Send + Sync {
    /// Executes a program and returns its captured output.
    fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Checks if a program exists in PATH.
    fn program_exists(&self, program: &str) -> bool;
}

/// Contract the workflow relies on: command in, captured text out.
pub trait ShellExecutor: Send + Sync {
    fn execute(&self, command: &str) -> String;
}

// =============================================================================
// Default Implementations
// =============================================================================

/// Default process runner using std::process::Command.
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        Ok(Command::new(program).args(args).output()?)
    }

    fn program_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

// =============================================================================
// Executor Implementation
// =============================================================================

/// Hands each command to `<shell> -c` and captures what it prints.
///
/// # Example
///
/// ```no_run
/// use shell_commander::executor::{Executor, ShellExecutor};
///
/// let executor = Executor::new("sh");
/// let listing = executor.execute("ls -lha ~/");
/// println!("{}", listing);
/// ```
pub struct Executor<P: ProcessRunner = SystemProcessRunner> {
    shell: String,
    runner: P,
}

impl Executor<SystemProcessRunner> {
    pub fn new(shell: impl Into<String>) -> Self {
        Self::with_runner(shell, SystemProcessRunner)
    }
}

impl<P: ProcessRunner> Executor<P> {
    /// Creates an executor with an injected process runner (for testing).
    pub fn with_runner(shell: impl Into<String>, runner: P) -> Self {
        Self {
            shell: shell.into(),
            runner,
        }
    }

    fn try_execute(&self, command: &str) -> Result<Output> {
        if !self.runner.program_exists(&self.shell) {
            return Err(anyhow!("shell '{}' was not found in PATH", self.shell));
        }

        info!("Executing shell command: {}", command);
        self.runner.run(&self.shell, &["-c", command])
    }

    /// Converts process output into the text handed back to the workflow.
    fn render_output(output: &Output) -> String {
        if output.status.success() {
            String::from_utf8_lossy(&output.stdout).into_owned()
        } else {
            error!("Command failed with status: {}", output.status);
            format!(
                "{} {}",
                EXECUTION_ERROR_PREFIX,
                String::from_utf8_lossy(&output.stderr)
            )
        }
    }
}

impl<P: ProcessRunner> ShellExecutor for Executor<P> {
    fn execute(&self, command: &str) -> String {
        match self.try_execute(command) {
            Ok(output) => Self::render_output(&output),
            Err(e) => {
                error!("Failed to run command: {}", e);
                format!("{} {}", EXECUTION_ERROR_PREFIX, e)
            }
        }
    }
}
