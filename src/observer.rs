//! Hooks called after every workflow transition.

use crate::workflow::{Stage, WorkflowState};
use std::io::Write;
use tracing::{info, warn};

const PANEL_WIDTH: usize = 60;

pub trait TransitionObserver: Send {
    /// Called once per `advance`, with the stage left and the state entered.
    fn on_transition(&mut self, from: Stage, state: &WorkflowState);
}

/// Emits one structured log event per transition.
pub struct TracingObserver;

impl TransitionObserver for TracingObserver {
    fn on_transition(&mut self, from: Stage, state: &WorkflowState) {
        info!(
            from = %from,
            to = %state.cursor(),
            command = state.proposed_command().unwrap_or("-"),
            turns = state.turns().len(),
            "transition"
        );
    }
}

/// Prints a framed panel per transition, for following the machine live.
pub struct PanelObserver<W> {
    output: W,
}

impl PanelObserver<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> PanelObserver<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    fn write_panel(&mut self, from: Stage, state: &WorkflowState) -> std::io::Result<()> {
        let border = format!("+{}+", "-".repeat(PANEL_WIDTH));
        writeln!(self.output, "{}", border)?;
        writeln!(self.output, "| Transition: {} -> {}", from, state.cursor())?;
        writeln!(
            self.output,
            "| Command: {}",
            state.proposed_command().unwrap_or("None")
        )?;
        writeln!(self.output, "| Messages: {}", state.turns().len())?;
        writeln!(self.output, "{}", border)?;
        self.output.flush()
    }
}

impl<W: Write + Send> TransitionObserver for PanelObserver<W> {
    fn on_transition(&mut self, from: Stage, state: &WorkflowState) {
        if let Err(e) = self.write_panel(from, state) {
            warn!("Failed to print transition panel: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_shows_transition_and_message_count() {
        let mut observer = PanelObserver::new(Vec::<u8>::new());

        observer.on_transition(Stage::Terminated, &WorkflowState::new());

        let printed = String::from_utf8(observer.into_inner()).unwrap();
        assert!(printed.contains("Transition: Terminated -> Awaiting-Input"));
        assert!(printed.contains("Command: None"));
        assert!(printed.contains("Messages: 0"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_panel_write_failure_is_reported_not_raised() {
        let mut observer = PanelObserver::new(BrokenPipe);
        assert!(observer.write_panel(Stage::Generating, &WorkflowState::new()).is_err());

        observer.on_transition(Stage::Generating, &WorkflowState::new());
    }

    #[test]
    fn test_tracing_observer_does_not_panic_without_subscriber() {
        TracingObserver.on_transition(Stage::Generating, &WorkflowState::new());
    }
}
