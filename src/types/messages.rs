//! Message types for chat completion requests
//!
//! Defines the role-tagged messages sent to the completion provider and
//! the per-session conversation history they are built from.

use serde::{Deserialize, Serialize};

/// Author of a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
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

/// A single (role, content) message in a completion request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One finished exchange: what the user asked and what the assistant answered
///
/// Serialized as a two-element array `["user", "assistant"]` so shells can
/// pass history in the same pair form chat UIs use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ConversationTurn {
    pub user: String,
    pub assistant: String,
}

impl ConversationTurn {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

impl From<(String, String)> for ConversationTurn {
    fn from((user, assistant): (String, String)) -> Self {
        Self { user, assistant }
    }
}

impl From<ConversationTurn> for (String, String) {
    fn from(turn: ConversationTurn) -> Self {
        (turn.user, turn.assistant)
    }
}

/// Chronological conversation history for one session
///
/// Insertion order is chronological order. Lives only in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct History {
    turns: Vec<ConversationTurn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished turn at the end
    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Most recent turns, newest first
    pub fn recent(&self, limit: usize) -> Vec<&ConversationTurn> {
        self.turns.iter().rev().take(limit).collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConversationTurn> {
        self.turns.iter()
    }
}

impl From<Vec<ConversationTurn>> for History {
    fn from(turns: Vec<ConversationTurn>) -> Self {
        Self { turns }
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a ConversationTurn;
    type IntoIter = std::slice::Iter<'a, ConversationTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
