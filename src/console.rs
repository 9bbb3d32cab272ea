//! Console surface and approval gate.
//!
//! Everything the person at the terminal sees or types goes through here.
//! [`ConsoleUI`] is generic over its reader and writer so tests can drive it
//! with a `Cursor` and inspect a `Vec<u8>`.

use anyhow::Result;
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use tracing::info;

const RULE_WIDTH: usize = 50;

/// Words accepted as the quit signal at the request prompt.
pub const QUIT_WORDS: &[&str] = &["quit()", "exit"];

/// A line read at the request prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Request(String),
    Quit,
}

/// Free-text input and informational output.
pub trait Console {
    /// Blocks until the user types a non-blank request or signals quit.
    fn read_request(&mut self) -> Result<UserInput>;

    fn show_banner(&mut self) -> Result<()>;

    fn show_command(&mut self, command: &str) -> Result<()>;

    fn show_output(&mut self, output: &str) -> Result<()>;

    fn warn_unsafe(&mut self) -> Result<()>;

    fn show_cancelled(&mut self) -> Result<()>;

    fn show_error(&mut self, message: &str) -> Result<()>;
}

/// Human confirmation before anything runs, and before output is fed back.
pub trait ApprovalGate {
    fn confirm_execution(&mut self, command: &str) -> Result<bool>;

    fn confirm_analysis(&mut self) -> Result<bool>;
}

/// Line-oriented terminal UI.
///
/// # Example
///
/// ```
/// use shell_commander::console::{ApprovalGate, ConsoleUI};
/// use std::io::Cursor;
///
/// let mut ui = ConsoleUI::new(Cursor::new(b"y\n".to_vec()), Vec::<u8>::new());
/// assert!(ui.confirm_execution("ls -lha ~/")?);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct ConsoleUI<R, W> {
    input: R,
    output: W,
}

impl ConsoleUI<StdinLock<'static>, Stdout> {
    /// Creates a UI over the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleUI<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Gives back the writer, mostly so tests can inspect what was printed.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Prints `prompt` and reads one line. `None` means end of input.
    fn prompt_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn prompt_yes_no(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.prompt_line(prompt)?.unwrap_or_default().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }

    fn write_section(&mut self, title: &str, body: &str) -> Result<()> {
        let rule = "-".repeat(RULE_WIDTH);
        writeln!(self.output, "\n{}:", title)?;
        writeln!(self.output, "{}", rule)?;
        writeln!(self.output, "{}", body.trim_end())?;
        writeln!(self.output, "{}", rule)?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> Console for ConsoleUI<R, W> {
    fn read_request(&mut self) -> Result<UserInput> {
        loop {
            let Some(line) = self.prompt_line("\nEnter your request: ")? else {
                info!("Input closed, treating as quit");
                return Ok(UserInput::Quit);
            };

            if QUIT_WORDS.iter().any(|word| line.eq_ignore_ascii_case(word)) {
                info!("Quit command received");
                return Ok(UserInput::Quit);
            }

            if !line.is_empty() {
                info!("User input: {}", line);
                return Ok(UserInput::Request(line));
            }
        }
    }

    fn show_banner(&mut self) -> Result<()> {
        writeln!(self.output, "Shell Command Assistant")?;
        writeln!(self.output, "Type 'quit()' to quit")?;
        writeln!(self.output, "{}", "-".repeat(RULE_WIDTH))?;
        Ok(())
    }

    fn show_command(&mut self, command: &str) -> Result<()> {
        self.write_section("Generated command", command)
    }

    fn show_output(&mut self, output: &str) -> Result<()> {
        self.write_section("Output", output)
    }

    fn warn_unsafe(&mut self) -> Result<()> {
        writeln!(
            self.output,
            "⚠️ This command request was deemed unsafe and will not be executed."
        )?;
        Ok(())
    }

    fn show_cancelled(&mut self) -> Result<()> {
        writeln!(self.output, "Command execution cancelled.")?;
        Ok(())
    }

    fn show_error(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "❌ Error processing request: {}", message)?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> ApprovalGate for ConsoleUI<R, W> {
    fn confirm_execution(&mut self, command: &str) -> Result<bool> {
        let approved = self.prompt_yes_no("Execute this command? (y/n): ")?;
        info!("User {} command '{}'", if approved { "approved" } else { "declined" }, command);
        Ok(approved)
    }

    fn confirm_analysis(&mut self) -> Result<bool> {
        self.prompt_yes_no("\nDo you want to analyze the output? (y/n): ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ui(input: &str) -> ConsoleUI<Cursor<Vec<u8>>, Vec<u8>> {
        ConsoleUI::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn printed(ui: ConsoleUI<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(ui.into_output()).unwrap()
    }

    // =========================================================================
    // read_request tests
    // =========================================================================

    #[test]
    fn test_read_request_returns_trimmed_text() {
        let mut ui = ui("  show content of folder ~/  \n");
        assert_eq!(
            ui.read_request().unwrap(),
            UserInput::Request("show content of folder ~/".to_string())
        );
        assert!(printed(ui).contains("Enter your request:"));
    }

    #[test]
    fn test_read_request_quit_is_case_insensitive() {
        assert_eq!(ui("QUIT()\n").read_request().unwrap(), UserInput::Quit);
        assert_eq!(ui("Exit\n").read_request().unwrap(), UserInput::Quit);
    }

    #[test]
    fn test_read_request_treats_end_of_input_as_quit() {
        assert_eq!(ui("").read_request().unwrap(), UserInput::Quit);
    }

    #[test]
    fn test_read_request_skips_blank_lines() {
        let mut ui = ui("\n   \ndf -h\n");
        assert_eq!(
            ui.read_request().unwrap(),
            UserInput::Request("df -h".to_string())
        );
    }

    // =========================================================================
    // approval gate tests
    // =========================================================================

    #[test]
    fn test_confirm_execution_accepts_y_and_yes() {
        assert!(ui("y\n").confirm_execution("ls").unwrap());
        assert!(ui("YES\n").confirm_execution("ls").unwrap());
    }

    #[test]
    fn test_confirm_execution_declines_anything_else() {
        assert!(!ui("n\n").confirm_execution("ls").unwrap());
        assert!(!ui("sure\n").confirm_execution("ls").unwrap());
        assert!(!ui("").confirm_execution("ls").unwrap());
    }

    #[test]
    fn test_confirm_analysis_prompts() {
        let mut ui = ui("y\n");
        assert!(ui.confirm_analysis().unwrap());
        assert!(printed(ui).contains("analyze the output"));
    }

    // =========================================================================
    // output tests
    // =========================================================================

    #[test]
    fn test_show_command_frames_the_command() {
        let mut ui = ui("");
        ui.show_command("ls -lha ~/").unwrap();

        let out = printed(ui);
        assert!(out.contains("Generated command:"));
        assert!(out.contains("ls -lha ~/"));
        assert!(out.contains(&"-".repeat(RULE_WIDTH)));
    }

    #[test]
    fn test_show_output_labels_section() {
        let mut ui = ui("");
        ui.show_output("total 0\n").unwrap();
        assert!(printed(ui).contains("Output:\n"));
    }

    #[test]
    fn test_warn_unsafe_and_error_messages() {
        let mut ui = ui("");
        ui.warn_unsafe().unwrap();
        ui.show_error("connection refused").unwrap();

        let out = printed(ui);
        assert!(out.contains("deemed unsafe"));
        assert!(out.contains("Error processing request: connection refused"));
    }
}
