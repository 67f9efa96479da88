//! # Conversation transcript
//!
//! Holds the rolling user/assistant exchange for the chat operation. The
//! buffer is append-only between [`Transcript::clear`] calls and lives only
//! in process memory for the lifetime of the owning gateway.
//!
//! An optional entry cap bounds growth: once exceeded, the oldest turns are
//! ejected in user/assistant pairs so the remaining transcript still starts
//! on a user turn.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Sender of a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// The conversation buffer.
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    max_entries: Option<usize>,
}

impl Transcript {
    /// Create an empty transcript with an optional entry cap.
    ///
    /// A cap below 2 is raised to 2: the buffer must always be able to hold
    /// the user/assistant pair of the turn in flight, otherwise every
    /// exchange would eject itself and context could never accumulate.
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            turns: Vec::new(),
            max_entries: max_entries.map(|max| max.max(2)),
        }
    }

    /// Append a user turn, ejecting the oldest pair if the cap is exceeded.
    pub fn push_user(&mut self, text: String) {
        self.turns.push(Turn {
            role: Role::User,
            text,
        });
        self.eject_if_needed();
    }

    /// Append an assistant turn, ejecting the oldest pair if the cap is
    /// exceeded.
    pub fn push_assistant(&mut self, text: String) {
        self.turns.push(Turn {
            role: Role::Assistant,
            text,
        });
        self.eject_if_needed();
    }

    /// Read-only view of the turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Empty the transcript. Idempotent.
    pub fn clear(&mut self) {
        self.turns.clear();
        info!("Conversation history cleared");
    }

    fn eject_if_needed(&mut self) {
        let Some(max) = self.max_entries else {
            return;
        };

        while self.turns.len() > max && self.turns.len() >= 2 {
            let ejected: Vec<Turn> = self.turns.drain(0..2).collect();
            info!("Ejected {} oldest transcript turn(s)", ejected.len());
        }
    }
}
