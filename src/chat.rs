//! Conversation state: append-only message history plus the in-flight flag.
//!
//! Two states, `Idle` and `AwaitingReply`, realized as the `pending` flag.
//! The generation counter tags every outgoing request so that a reply
//! arriving after a destructive reset can be recognized as stale and
//! dropped instead of landing in the fresh history.

use crate::models::Message;
use crate::prompts::{CHAT_CLEARED_MESSAGE, WELCOME_MESSAGE};

/// Observable outcome of a submit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty/whitespace text, or a request was already in flight. No-op.
    Rejected,
    /// The backend replied; an assistant message was appended.
    Replied,
    /// The backend failed; a flagged apology message was appended.
    Failed,
    /// The conversation was cleared while the request was in flight; the
    /// late reply was discarded.
    Dropped,
}

/// Message history and request lifecycle of one chat session.
#[derive(Debug)]
pub struct Conversation {
    messages: Vec<Message>,
    pending: bool,
    generation: u64,
}

impl Conversation {
    /// A fresh conversation seeded with the welcome message.
    pub fn new() -> Self {
        Self {
            messages: vec![Message::assistant(WELCOME_MESSAGE)],
            pending: false,
            generation: 0,
        }
    }

    /// Destructive reset: one seed message, forced `Idle`, new generation.
    /// An in-flight request is not cancelled; its reply will be dropped when
    /// it resolves because its generation no longer matches.
    pub fn reset(&mut self) {
        self.messages = vec![Message::assistant(CHAT_CLEARED_MESSAGE)];
        self.pending = false;
        self.generation += 1;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// `true` while exactly one request is in flight (`AwaitingReply`).
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
