use tracing::error;

use crate::backend_client::BackendError;

/// First assistant turn of every session.
pub const GREETING: &str = "Hello! I'm your AI-powered diabetes management assistant. Feel free to ask me anything about diabetes management, lifestyle adjustments or specific concerns about your readings.";

/// Fixed reply appended when a chat request cannot reach the backend.
pub const CHAT_UNREACHABLE: &str =
    "❌ Error: Cannot connect to backend. Make sure it's running on port 8000.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

/// An accepted chat submission. Settling it appends the assistant turn
/// and reopens the flow, so every acceptance settles exactly once.
#[derive(Debug)]
pub struct ChatTicket {
    message: String,
}

impl ChatTicket {
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Append-only conversation log plus the single in-flight chat slot.
pub struct ConversationFlow {
    turns: Vec<ConversationTurn>,
    pending: bool,
}

impl ConversationFlow {
    pub fn new() -> Self {
        Self {
            turns: vec![ConversationTurn {
                role: Role::Assistant,
                content: GREETING.to_string(),
            }],
            pending: false,
        }
    }

    /// Accept a chat submission. Blank input is a no-op, and a second
    /// submission is rejected while one is outstanding. On acceptance the
    /// user turn is appended immediately, before any request is issued.
    pub fn submit(&mut self, text: &str) -> Option<ChatTicket> {
        if self.pending || text.trim().is_empty() {
            return None;
        }

        self.turns.push(ConversationTurn {
            role: Role::User,
            content: text.to_string(),
        });
        self.pending = true;

        Some(ChatTicket {
            message: text.to_string(),
        })
    }

    /// Record the settlement of an accepted submission: one assistant
    /// turn, the reply on success or the fixed unreachable message on
    /// failure.
    pub fn settle(&mut self, _ticket: ChatTicket, outcome: Result<String, BackendError>) {
        let content = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                error!("chat request failed: {}", e);
                CHAT_UNREACHABLE.to_string()
            }
        };

        self.turns.push(ConversationTurn {
            role: Role::Assistant,
            content,
        });
        self.pending = false;
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn in_flight(&self) -> bool {
        self.pending
    }
}
