//! The propose / review / approve / execute state machine.
//!
//! [`WorkflowEngine::advance`] takes the current [`WorkflowState`] by value,
//! performs exactly one collaborator call for the stage the cursor points at,
//! and returns the next state. [`WorkflowEngine::run`] repeats that until the
//! user quits.
//!
//! | From              | Event                 | To                |
//! |-------------------|-----------------------|-------------------|
//! | Awaiting-Input    | quit                  | Terminated        |
//! | Awaiting-Input    | request               | Generating        |
//! | Generating        | refusal               | Awaiting-Input    |
//! | Generating        | command               | Reviewing         |
//! | Reviewing         | approved              | Awaiting-Approval |
//! | Reviewing         | rejected              | Generating        |
//! | Awaiting-Approval | declined              | Awaiting-Input    |
//! | Awaiting-Approval | approved              | Executing         |
//! | Executing         | always                | Analyzing-Output  |
//! | Analyzing-Output  | analyze               | Generating        |
//! | Analyzing-Output  | declined              | Awaiting-Input    |
//!
//! Any collaborator failure is shown to the user and resets the state; only a
//! broken invariant or a dead console ends [`WorkflowEngine::run`] early.

use crate::console::{ApprovalGate, Console, UserInput};
use crate::conversation::{Conversation, Turn};
use crate::error::{Result, WorkflowError};
use crate::executor::ShellExecutor;
use crate::generator::{CommandGenerator, Generation, is_refusal};
use crate::observer::TransitionObserver;
use crate::reviewer::{CommandReviewer, Verdict};
use std::fmt;
use tracing::{debug, error, info, warn};

/// Where the machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    AwaitingInput,
    Generating,
    Reviewing,
    AwaitingApproval,
    Executing,
    AnalyzingOutput,
    Terminated,
}

impl Stage {
    /// Stages that may only be entered with a proposed command in hand.
    pub fn requires_command(self) -> bool {
        matches!(
            self,
            Stage::Reviewing | Stage::AwaitingApproval | Stage::Executing
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::AwaitingInput => "Awaiting-Input",
            Stage::Generating => "Generating",
            Stage::Reviewing => "Reviewing",
            Stage::AwaitingApproval => "Awaiting-Approval",
            Stage::Executing => "Executing",
            Stage::AnalyzingOutput => "Analyzing-Output",
            Stage::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}

/// Everything the engine knows about the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowState {
    turns: Conversation,
    proposed_command: Option<String>,
    last_output: Option<String>,
    cursor: Stage,
    review_rounds: u32,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowState {
    /// A fresh state waiting for the first request.
    pub fn new() -> Self {
        Self {
            turns: Conversation::new(),
            proposed_command: None,
            last_output: None,
            cursor: Stage::AwaitingInput,
            review_rounds: 0,
        }
    }

    /// Discards turns, command and output together and waits for new input.
    pub fn reset(self) -> Self {
        Self::new()
    }

    pub fn turns(&self) -> &Conversation {
        &self.turns
    }

    pub fn proposed_command(&self) -> Option<&str> {
        self.proposed_command.as_deref()
    }

    pub fn last_output(&self) -> Option<&str> {
        self.last_output.as_deref()
    }

    pub fn cursor(&self) -> Stage {
        self.cursor
    }

    /// Consecutive reviewer rejections since the last generated-and-approved command.
    pub fn review_rounds(&self) -> u32 {
        self.review_rounds
    }

    pub fn is_terminated(&self) -> bool {
        self.cursor == Stage::Terminated
    }

    fn moved_to(mut self, stage: Stage) -> Self {
        self.cursor = stage;
        self
    }
}

/// Bound on the Generating/Reviewing loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Give up after this many rejections for one request. `None` never gives up.
    pub max_review_rounds: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn bounded(max_review_rounds: u32) -> Self {
        Self {
            max_review_rounds: Some(max_review_rounds),
        }
    }

    fn exhausted(&self, rounds: u32) -> bool {
        self.max_review_rounds.is_some_and(|max| rounds >= max)
    }
}

/// Picks the command to present when the generator offered several lines.
///
/// The first non-blank line wins, whatever the reviewer's rationale preferred.
pub fn select_candidate(command: &str) -> &str {
    command
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_else(|| command.trim())
}

/// Drives one [`WorkflowState`] through its collaborators.
pub struct WorkflowEngine<U> {
    generator: Box<dyn CommandGenerator>,
    reviewer: Box<dyn CommandReviewer>,
    executor: Box<dyn ShellExecutor>,
    ui: U,
    policy: RetryPolicy,
    observers: Vec<Box<dyn TransitionObserver>>,
}

impl<U: Console + ApprovalGate> WorkflowEngine<U> {
    pub fn new(
        generator: Box<dyn CommandGenerator>,
        reviewer: Box<dyn CommandReviewer>,
        executor: Box<dyn ShellExecutor>,
        ui: U,
    ) -> Self {
        Self {
            generator,
            reviewer,
            executor,
            ui,
            policy: RetryPolicy::unbounded(),
            observers: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn TransitionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn into_ui(self) -> U {
        self.ui
    }

    /// Runs until the user quits, returning the terminated state.
    ///
    /// # Errors
    ///
    /// Only invariant violations and console failures are returned; every
    /// collaborator failure is reported to the user and the loop continues.
    pub async fn run(&mut self) -> Result<WorkflowState> {
        self.ui.show_banner().map_err(WorkflowError::Console)?;

        let mut state = WorkflowState::new();
        while !state.is_terminated() {
            state = self.advance(state).await.inspect_err(|e| {
                error!("Workflow aborted: {}", e);
            })?;
        }

        info!("Ending program");
        Ok(state)
    }

    /// Performs the single step the cursor calls for.
    pub async fn advance(&mut self, state: WorkflowState) -> Result<WorkflowState> {
        let from = state.cursor();
        debug!("Entering {}", from);

        let next = match from {
            Stage::AwaitingInput => self.await_input(state)?,
            Stage::Generating => self.generate(state).await?,
            Stage::Reviewing => self.review(state).await?,
            Stage::AwaitingApproval => self.await_approval(state)?,
            Stage::Executing => self.execute(state)?,
            Stage::AnalyzingOutput => self.analyze_output(state)?,
            Stage::Terminated => return Err(WorkflowError::TerminatedStateAdvanced),
        };

        Self::check_invariants(&next)?;
        for observer in &mut self.observers {
            observer.on_transition(from, &next);
        }
        Ok(next)
    }

    fn await_input(&mut self, mut state: WorkflowState) -> Result<WorkflowState> {
        match self.ui.read_request().map_err(WorkflowError::Console)? {
            UserInput::Quit => Ok(state.moved_to(Stage::Terminated)),
            UserInput::Request(text) => {
                state.turns.push(Turn::human(text));
                Ok(state.moved_to(Stage::Generating))
            }
        }
    }

    async fn generate(&mut self, mut state: WorkflowState) -> Result<WorkflowState> {
        let context = state.turns.render();
        let generation = self.generator.generate(&context).await;
        match generation {
            Err(e) => self.fail(state, e),
            Ok(Generation::Refused) => {
                warn!("Request refused as unsafe");
                self.ui.warn_unsafe().map_err(WorkflowError::Console)?;
                Ok(state.reset())
            }
            Ok(Generation::Command(command)) => {
                info!("Generated command: {}", command);
                state.proposed_command = Some(command);
                Ok(state.moved_to(Stage::Reviewing))
            }
        }
    }

    async fn review(&mut self, mut state: WorkflowState) -> Result<WorkflowState> {
        let command = Self::require_command(&state)?.to_string();
        let review = match self.reviewer.review(&command).await {
            Ok(review) => review,
            Err(e) => return self.fail(state, e),
        };

        match review.verdict {
            Verdict::Approved => {
                let selected = select_candidate(&command);
                if selected != command {
                    info!("Multiple commands found, selected: {}", selected);
                }
                state.proposed_command = Some(selected.to_string());
                state.review_rounds = 0;
                Ok(state.moved_to(Stage::AwaitingApproval))
            }
            Verdict::Rejected => {
                warn!("Command rejected: {}", review.rationale);
                state
                    .turns
                    .push(Turn::system(format!("Command needs revision: {}", review.rationale)));
                state.proposed_command = None;
                state.review_rounds += 1;

                if self.policy.exhausted(state.review_rounds) {
                    let message = format!(
                        "reviewer rejected {} proposals in a row, giving up",
                        state.review_rounds
                    );
                    return self.fail(state, anyhow::anyhow!(message));
                }
                Ok(state.moved_to(Stage::Generating))
            }
        }
    }

    fn await_approval(&mut self, state: WorkflowState) -> Result<WorkflowState> {
        let command = Self::require_command(&state)?;
        self.ui.show_command(command).map_err(WorkflowError::Console)?;

        if self
            .ui
            .confirm_execution(command)
            .map_err(WorkflowError::Console)?
        {
            Ok(state.moved_to(Stage::Executing))
        } else {
            self.ui.show_cancelled().map_err(WorkflowError::Console)?;
            Ok(state.reset())
        }
    }

    fn execute(&mut self, mut state: WorkflowState) -> Result<WorkflowState> {
        let output = self.executor.execute(Self::require_command(&state)?);
        self.ui.show_output(&output).map_err(WorkflowError::Console)?;
        state.last_output = Some(output);
        Ok(state.moved_to(Stage::AnalyzingOutput))
    }

    fn analyze_output(&mut self, mut state: WorkflowState) -> Result<WorkflowState> {
        let Some(output) = state.last_output.clone() else {
            return Err(WorkflowError::MissingOutput);
        };

        if self.ui.confirm_analysis().map_err(WorkflowError::Console)? {
            state.turns.push(Turn::system(format!("Command output: {}", output)));
            Ok(state.moved_to(Stage::Generating))
        } else {
            Ok(state.reset())
        }
    }

    /// Reports a collaborator failure and starts over.
    fn fail(&mut self, state: WorkflowState, err: anyhow::Error) -> Result<WorkflowState> {
        error!("Error processing request: {:#}", err);
        self.ui
            .show_error(&format!("{:#}", err))
            .map_err(WorkflowError::Console)?;
        Ok(state.reset())
    }

    fn require_command(state: &WorkflowState) -> Result<&str> {
        match state.proposed_command() {
            Some(command) if !command.trim().is_empty() => Ok(command),
            _ => Err(WorkflowError::MissingCommand {
                stage: state.cursor(),
            }),
        }
    }

    fn check_invariants(state: &WorkflowState) -> Result<()> {
        let stage = state.cursor();
        if stage.requires_command() {
            let command = Self::require_command(state)?;
            if is_refusal(command) {
                return Err(WorkflowError::RefusalLeaked { stage });
            }
        }
        Ok(())
    }
}
