//! Conversation turns.

use serde::{Deserialize, Serialize};

/// Turn author. Serialized as the two wire strings `user` / `assistant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// One message in a conversation.
///
/// An ordered `Vec<ChatTurn>` is the history sent to the model; order matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}

/// An assistant turn under construction.
///
/// Starts empty, grows one chunk at a time while a reply streams, and is
/// frozen into an immutable [`ChatTurn`] on completion or error.
#[derive(Debug, Default, Clone)]
pub struct AssistantDraft {
    content: String,
    chunks: usize,
}

impl AssistantDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, chunk: &str) {
        self.content.push_str(chunk);
        self.chunks += 1;
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Number of chunks appended so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn freeze(self) -> ChatTurn {
        ChatTurn::assistant(self.content)
    }
}
