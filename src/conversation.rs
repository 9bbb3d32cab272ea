//! Conversation log passed as context to the completion backends.
//!
//! The log is append-only: turns are never edited once recorded. The only
//! way to shrink it is to replace it wholesale with an empty log on reset.

use std::fmt;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    /// Typed by the person at the console.
    Human,
    /// Produced by the workflow itself (reviewer feedback, command output).
    System,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Author::Human => write!(f, "human"),
            Author::System => write!(f, "system"),
        }
    }
}

/// A single immutable entry in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    author: Author,
    content: String,
}

impl Turn {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            author: Author::Human,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            author: Author::System,
            content: content.into(),
        }
    }

    pub fn author(&self) -> Author {
        self.author
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered sequence of turns; insertion order is chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Renders the history as the plain-text context handed to the generator.
    ///
    /// Each turn contributes its content verbatim, one turn per line.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(Turn::content)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
