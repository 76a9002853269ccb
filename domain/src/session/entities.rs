//! Session domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a turn in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single turn in a conversation (Entity)
///
/// Immutable once appended to a session; insertion order is the
/// conversation order and is replayed verbatim to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// An agent's conversation session (Entity)
///
/// Owned exclusively by one agent identity. Holds the ordered turn
/// sequence; `append` is the only mutator, `reset` clears history on
/// explicit operator action only.
#[derive(Debug, Clone, Default)]
pub struct Session {
    system_prompt: Option<String>,
    turns: Vec<Turn>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session seeded with a system prompt as its first turn.
    pub fn with_system_prompt(system_prompt: impl Into<String>) -> Self {
        let prompt = system_prompt.into();
        Self {
            turns: vec![Turn::system(prompt.clone())],
            system_prompt: Some(prompt),
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a turn, preserving insertion order.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Clear the history. The configured system prompt (if any) is
    /// re-seeded so the next exchange starts from the same baseline.
    pub fn reset(&mut self) {
        self.turns.clear();
        if let Some(prompt) = &self.system_prompt {
            self.turns.push(Turn::system(prompt.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut session = Session::new();
        session.append(Turn::user("first"));
        session.append(Turn::assistant("second"));
        session.append(Turn::user("third"));

        let contents: Vec<&str> = session.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_system_prompt_is_first_turn() {
        let session = Session::with_system_prompt("You are worker A.");
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.turns()[0].role, Role::System);
        assert_eq!(session.turns()[0].content, "You are worker A.");
    }

    #[test]
    fn test_reset_reseeds_system_prompt() {
        let mut session = Session::with_system_prompt("prompt");
        session.append(Turn::user("hello"));
        session.append(Turn::assistant("hi"));

        session.reset();
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.turns()[0].content, "prompt");
    }

    #[test]
    fn test_reset_without_prompt_clears_everything() {
        let mut session = Session::new();
        session.append(Turn::user("hello"));
        session.reset();
        assert!(session.is_empty());
    }
}
