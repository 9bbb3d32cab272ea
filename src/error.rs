//! Faults that abort a workflow run.
//!
//! Collaborator failures are not represented here: the engine reports them to
//! the user and resets. Only broken engine invariants and a dead console end
//! the run early.

use crate::workflow::Stage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A stage that needs a proposed command was entered without one.
    #[error("invariant violated: no proposed command while {stage}")]
    MissingCommand { stage: Stage },

    /// The generator's refusal marker reached a stage it must never reach.
    #[error("invariant violated: refusal marker leaked into {stage}")]
    RefusalLeaked { stage: Stage },

    /// Output analysis was reached before anything was executed.
    #[error("invariant violated: no captured output to analyze")]
    MissingOutput,

    /// `advance` was called after the machine already terminated.
    #[error("invariant violated: cannot advance a terminated workflow")]
    TerminatedStateAdvanced,

    /// Reading from or writing to the console failed.
    #[error("console I/O failed: {0}")]
    Console(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_command_names_the_stage() {
        let err = WorkflowError::MissingCommand {
            stage: Stage::Reviewing,
        };
        assert!(err.to_string().contains("Reviewing"));
    }

    #[test]
    fn test_console_error_keeps_source() {
        let err = WorkflowError::Console(anyhow::anyhow!("stdout closed"));
        assert!(err.to_string().contains("stdout closed"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
