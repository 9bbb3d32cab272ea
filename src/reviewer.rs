use crate::completion::CompletionBackend;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

const REVIEWER_PROMPT: &str = "You are a Linux command reviewer. Review the proposed commands for safety and correctness.
If the command is safe and correct, respond with 'APPROVED' followed by your reasoning.
If multiple commands are provided, review each one and respond with 'APPROVED' for the best one.
Do not surround your suggested command with ``` or ```bash. Just the command, for instance \"ls -l /\".
If none are safe, explain what needs to be fixed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Rejected,
}

/// Reviewer outcome: a verdict plus the reviewer's own words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub verdict: Verdict,
    pub rationale: String,
}

impl Review {
    pub fn approved(rationale: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Approved,
            rationale: rationale.into(),
        }
    }

    pub fn rejected(rationale: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Rejected,
            rationale: rationale.into(),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.verdict == Verdict::Approved
    }
}

#[async_trait]
pub trait CommandReviewer: Send + Sync {
    /// Judges `command`, which may hold several newline-separated candidates.
    async fn review(&self, command: &str) -> Result<Review>;
}

/// Reviewer backed by a completion model.
pub struct LlmReviewer {
    backend: Arc<dyn CompletionBackend>,
}

impl LlmReviewer {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl CommandReviewer for LlmReviewer {
    async fn review(&self, command: &str) -> Result<Review> {
        info!("Reviewing command...");
        let input = format!("Review this command: {}", command);
        let reply = self.backend.complete(REVIEWER_PROMPT, &input).await?;
        let review = parse_review(&reply)?;
        info!("Review result: {:?}", review.verdict);
        Ok(review)
    }
}

/// Words that turn a following `APPROVED` into a rejection.
const NEGATIONS: &[&str] = &["NOT", "CANNOT", "NEVER", "NO", "ISN", "T", "WON"];

/// Maps the reviewer's free text onto a [`Verdict`].
///
/// The reply is approved when it carries the whole word `APPROVED` in capitals
/// with neither of the two preceding words negating it. `DISAPPROVED`,
/// `cannot be approved` and a lowercase `approved` in prose all reject.
pub fn parse_review(reply: &str) -> Result<Review> {
    let rationale = reply.trim();
    if rationale.is_empty() {
        return Err(anyhow!("Reviewer returned an empty response"));
    }

    if has_approval(rationale) {
        Ok(Review::approved(rationale))
    } else {
        warn!("Command rejected: {}", rationale);
        Ok(Review::rejected(rationale))
    }
}

fn has_approval(text: &str) -> bool {
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    words.iter().enumerate().any(|(i, word)| {
        *word == "APPROVED"
            && !words[i.saturating_sub(2)..i].iter().any(|prev| {
                NEGATIONS
                    .iter()
                    .any(|negation| prev.eq_ignore_ascii_case(negation))
            })
    })
}

/// Deterministic reviewer used in mock mode: approves anything that does not
/// touch the filesystem root.
pub struct MockReviewer;

impl MockReviewer {
    pub fn new() -> Self {
        Self
    }

    pub fn mock_review(&self, command: &str) -> Review {
        if command.lines().any(removes_root) {
            Review::rejected("Recursive removal is too risky; target a specific path instead.")
        } else {
            Review::approved("APPROVED: the command is read-only and safe.")
        }
    }
}

fn removes_root(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    words.contains(&"rm") && words.iter().any(|word| matches!(*word, "/" | "/*"))
}

impl Default for MockReviewer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandReviewer for MockReviewer {
    async fn review(&self, command: &str) -> Result<Review> {
        Ok(self.mock_review(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct EchoBackend {
        reply: String,
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionBackend for EchoBackend {
        async fn complete(&self, _system_prompt: &str, input: &str) -> Result<String> {
            self.inputs.lock().unwrap().push(input.to_string());
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_parse_approved_reply() {
        let review = parse_review("APPROVED. `ls -lha ~/` only reads the directory.").unwrap();
        assert!(review.is_approved());
        assert!(review.rationale.contains("only reads"));
    }

    #[test]
    fn test_parse_rejection_reply() {
        let review = parse_review("This deletes data recursively; add a confirmation.").unwrap();
        assert_eq!(review.verdict, Verdict::Rejected);
    }

    #[test]
    fn test_parse_negated_approval_is_rejection() {
        assert!(!parse_review("NOT APPROVED: too broad").unwrap().is_approved());
        assert!(!parse_review("Unapproved, use a narrower path").unwrap().is_approved());
    }

    #[test]
    fn test_parse_disapproval_is_rejection() {
        assert!(!parse_review("DISAPPROVED: this wipes /tmp recursively").unwrap().is_approved());
    }

    #[test]
    fn test_parse_cannot_be_approved_is_rejection() {
        assert!(!parse_review("This command cannot be approved; it deletes data.").unwrap().is_approved());
        assert!(!parse_review("CANNOT BE APPROVED: it deletes data.").unwrap().is_approved());
        assert!(!parse_review("It won't be APPROVED as written.").unwrap().is_approved());
    }

    #[test]
    fn test_parse_lowercase_approved_in_prose_is_rejection() {
        let review = parse_review("I would have approved a narrower path; this one is too broad.").unwrap();
        assert_eq!(review.verdict, Verdict::Rejected);
    }

    #[test]
    fn test_parse_approval_after_reasoning() {
        assert!(parse_review("`df -h` only reads usage. APPROVED").unwrap().is_approved());
        assert!(parse_review("'APPROVED' - safe listing").unwrap().is_approved());
    }

    #[test]
    fn test_parse_empty_reply_is_an_error() {
        assert!(parse_review("  ").is_err());
    }

    #[tokio::test]
    async fn test_llm_reviewer_frames_the_command() {
        let backend = Arc::new(EchoBackend {
            reply: "APPROVED".to_string(),
            inputs: Mutex::new(Vec::new()),
        });
        let reviewer = LlmReviewer::new(backend.clone());

        let review = reviewer.review("df -h").await.unwrap();

        assert!(review.is_approved());
        assert_eq!(backend.inputs.lock().unwrap()[0], "Review this command: df -h");
    }

    #[test]
    fn test_mock_reviewer_rejects_root_removal() {
        let reviewer = MockReviewer::new();
        assert!(!reviewer.mock_review("rm -rf /").is_approved());
        assert!(!reviewer.mock_review("sudo rm -rf /*").is_approved());
        assert!(reviewer.mock_review("ls -lha ~/").is_approved());
    }

    #[test]
    fn test_mock_reviewer_allows_scoped_removal() {
        assert!(MockReviewer::new().mock_review("rm -rf /tmp/x").is_approved());
    }
}
