//! Conversation store: ordered message history plus the latest background knowledge.

use serde::Serialize;

use crate::query_type::QueryType;

/// One chat message. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Creation timestamp in epoch milliseconds, unique within a conversation.
    pub id: i64,
    pub created_at: i64,
    pub text: String,
    pub is_assistant: bool,
    /// Mode active when the turn started.
    pub query_type: QueryType,
}

/// Append-only history owned by one chat session.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    background_knowledge: String,
    revision: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp for the next message. Strictly greater than the last id.
    fn next_stamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        match self.messages.last() {
            Some(last) if last.id >= now => last.id + 1,
            _ => now,
        }
    }

    /// Build a message stamped for this conversation (not yet appended).
    pub fn new_message(
        &self,
        text: impl Into<String>,
        is_assistant: bool,
        query_type: QueryType,
    ) -> Message {
        let stamp = self.next_stamp();
        Message {
            id: stamp,
            created_at: stamp,
            text: text.into(),
            is_assistant,
            query_type,
        }
    }

    /// Adds a message to the end of the history.
    pub fn append(&mut self, message: Message) {
        tracing::trace!(id = message.id, assistant = message.is_assistant, "append message");
        self.messages.push(message);
        self.revision += 1;
    }

    /// Replaces the background knowledge wholesale.
    pub fn set_knowledge(&mut self, text: impl Into<String>) {
        self.background_knowledge = text.into();
        self.revision += 1;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn knowledge(&self) -> &str {
        &self.background_knowledge
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Message texts in chronological order, user and assistant alike.
    pub fn history(&self) -> Vec<String> {
        self.messages.iter().map(|m| m.text.clone()).collect()
    }

    /// Bumped by every mutation; views re-render when it changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
