//! Shell Commander - turn natural-language requests into shell commands.
//!
//! A request goes through a fixed cycle, with a human confirming every step
//! that could change the machine:
//!
//! - **Generate** a command from the conversation so far
//! - **Review** it with a second model pass; rejections loop back to generation
//! - **Approve** it at the console before anything runs
//! - **Execute** it through the system shell and show the output
//! - **Analyze** the output, optionally feeding it back for a follow-up command
//!
//! # Architecture
//!
//! - [`workflow`] - The state machine driving the cycle
//! - [`conversation`] - Append-only turn history
//! - [`generator`] - Command generation contract and implementations
//! - [`reviewer`] - Command review contract with a typed verdict
//! - [`executor`] - Runs approved commands, always returning text
//! - [`console`] - Terminal prompts and the approval gate
//! - [`observer`] - Transition hooks (tracing, panels)
//! - [`completion`] - Completion backend (Ollama-compatible server)
//! - [`http_client`] - HTTP abstraction used by the backend
//! - [`config`] - Configuration file and environment overrides
//! - [`error`] - Faults that abort a run
//!
//! # Example
//!
//! ```ignore
//! use shell_commander::console::ConsoleUI;
//! use shell_commander::executor::Executor;
//! use shell_commander::generator::MockGenerator;
//! use shell_commander::reviewer::MockReviewer;
//! use shell_commander::workflow::WorkflowEngine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut engine = WorkflowEngine::new(
//!         Box::new(MockGenerator::new()),
//!         Box::new(MockReviewer::new()),
//!         Box::new(Executor::new("sh")),
//!         ConsoleUI::stdio(),
//!     );
//!     engine.run().await?;
//!     Ok(())
//! }
//! ```

pub mod completion;
pub mod config;
pub mod console;
pub mod conversation;
pub mod error;
pub mod executor;
pub mod generator;
pub mod http_client;
pub mod logging;
pub mod observer;
pub mod reviewer;
pub mod workflow;
