//! Chat session: the state behind the conversation view and the turn state machine.
//!
//! A turn goes Idle → Submitting ([`ChatSession::submit`]) → Awaiting (the
//! caller runs the returned [`PendingTurn`] against a [`Consult`]) →
//! Resolved ([`ChatSession::resolve`]) → Idle. Only one turn may be in
//! flight; the result of a cancelled or superseded turn is dropped.

use crate::client::{ClientError, Consult};
use crate::conversation::Conversation;
use crate::messages::RagReply;
use crate::query_type::{PromptTemplate, QueryType, TEMPLATES};
use crate::sanitizer::{ProfanityFilter, Sanitizer};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("the mode cannot change once the conversation has started")]
    ModeLocked,
    #[error("{} is not available yet", .0.label())]
    ModeUnavailable(QueryType),
    #[error("invalid query type: {0} has no RAG endpoint")]
    InvalidMode(QueryType),
    #[error("nothing to send")]
    EmptyInput,
    #[error("a request is already in flight")]
    Busy,
    #[error("no template #{0}")]
    NoTemplate(usize),
}

/// A submitted turn waiting for the RAG reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    pub id: u64,
    /// Sanitized user text.
    pub input: String,
    /// Message texts before this turn.
    pub history: Vec<String>,
    pub query_type: QueryType,
}

/// What [`ChatSession::resolve`] did with a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Answered,
    Failed,
    /// The turn was cancelled or is not the one in flight.
    Stale,
}

pub struct ChatSession {
    conversation: Conversation,
    sanitizer: Box<dyn Sanitizer>,
    query_type: QueryType,
    input: String,
    in_flight: Option<u64>,
    next_turn: u64,
    alert: Option<String>,
    /// Lines scrolled up from the newest content; 0 means pinned to the bottom.
    scroll_offset: usize,
    /// Largest useful `scroll_offset`, reported by the view after each draw.
    scroll_limit: usize,
    /// Lines scrolled down in the background knowledge panel.
    knowledge_offset: usize,
    knowledge_limit: usize,
    input_focused: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(Conversation::new(), ProfanityFilter::default())
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("messages", &self.conversation.len())
            .field("query_type", &self.query_type)
            .field("in_flight", &self.in_flight)
            .field("alert", &self.alert)
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    pub fn new(conversation: Conversation, sanitizer: impl Sanitizer + 'static) -> Self {
        Self {
            conversation,
            sanitizer: Box::new(sanitizer),
            query_type: QueryType::default(),
            input: String::new(),
            in_flight: None,
            next_turn: 1,
            alert: None,
            scroll_offset: 0,
            scroll_limit: usize::MAX,
            knowledge_offset: 0,
            knowledge_limit: usize::MAX,
            input_focused: false,
        }
    }

    /// Start with `query_type` preselected (e.g. from config). Does not check the lock.
    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = query_type;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn is_mode_locked(&self) -> bool {
        !self.conversation.is_empty()
    }

    /// Mode selector change.
    pub fn select_query_type(&mut self, query_type: QueryType) -> Result<(), SessionError> {
        if self.is_mode_locked() {
            return Err(SessionError::ModeLocked);
        }
        if !query_type.selectable() {
            return Err(SessionError::ModeUnavailable(query_type));
        }
        self.query_type = query_type;
        Ok(())
    }

    /// Advance the selector to the next selectable mode.
    pub fn cycle_query_type(&mut self) -> Result<QueryType, SessionError> {
        let next = self.query_type.next_selectable();
        self.select_query_type(next)?;
        Ok(next)
    }

    /// Example prompts; empty once the conversation has started.
    pub fn templates(&self) -> &'static [PromptTemplate] {
        if self.conversation.is_empty() {
            &TEMPLATES
        } else {
            &[]
        }
    }

    /// Fill the input from a template and switch to its mode.
    pub fn apply_template(&mut self, index: usize) -> Result<(), SessionError> {
        let template = self
            .templates()
            .get(index)
            .ok_or(SessionError::NoTemplate(index))?;
        self.input = template.prompt.to_string();
        self.query_type = template.query_type;
        Ok(())
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn insert_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn focus_input(&mut self) {
        self.input_focused = true;
    }

    pub fn is_input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn is_thinking(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Send control state.
    pub fn can_send(&self) -> bool {
        !self.is_thinking()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self
            .scroll_offset
            .saturating_add(lines)
            .min(self.scroll_limit);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Record how far the transcript can scroll (`total lines - visible rows`).
    pub fn set_scroll_limit(&mut self, limit: usize) {
        self.scroll_limit = limit;
        self.scroll_offset = self.scroll_offset.min(limit);
    }

    pub fn knowledge_offset(&self) -> usize {
        self.knowledge_offset
    }

    pub fn scroll_knowledge_down(&mut self, lines: usize) {
        self.knowledge_offset = self
            .knowledge_offset
            .saturating_add(lines)
            .min(self.knowledge_limit);
    }

    pub fn scroll_knowledge_up(&mut self, lines: usize) {
        self.knowledge_offset = self.knowledge_offset.saturating_sub(lines);
    }

    /// Record how far the knowledge panel can scroll.
    pub fn set_knowledge_scroll_limit(&mut self, limit: usize) {
        self.knowledge_limit = limit;
        self.knowledge_offset = self.knowledge_offset.min(limit);
    }

    /// Start a turn from the current input.
    ///
    /// A mode without an endpoint is rejected before any state changes and
    /// raised as an alert. Otherwise the input is sanitized and cleared and
    /// the user message is appended.
    pub fn submit(&mut self) -> Result<PendingTurn, SessionError> {
        if self.is_thinking() {
            return Err(SessionError::Busy);
        }
        if self.input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let query_type = self.query_type;
        if query_type.endpoint_segment().is_none() {
            let err = SessionError::InvalidMode(query_type);
            tracing::warn!(mode = %query_type, "submit rejected: mode has no endpoint");
            self.alert = Some(format!("Error: {err}"));
            return Err(err);
        }

        let input = self.sanitizer.sanitize(&self.input);
        self.input.clear();
        let history = self.conversation.history();
        let message = self.conversation.new_message(input.clone(), false, query_type);
        self.conversation.append(message);

        let id = self.next_turn;
        self.next_turn += 1;
        self.in_flight = Some(id);
        self.scroll_to_bottom();
        tracing::info!(turn = id, mode = %query_type, history = history.len(), "turn submitted");

        Ok(PendingTurn {
            id,
            input,
            history,
            query_type,
        })
    }

    /// Apply the outcome of `turn`. Knowledge is stored before the assistant
    /// message is appended, in the same call.
    pub fn resolve(
        &mut self,
        turn: &PendingTurn,
        result: Result<RagReply, ClientError>,
    ) -> TurnOutcome {
        if self.in_flight != Some(turn.id) {
            tracing::debug!(turn = turn.id, "dropping reply for a stale turn");
            return TurnOutcome::Stale;
        }
        self.in_flight = None;
        self.scroll_to_bottom();

        match result {
            Ok(reply) => {
                self.conversation.set_knowledge(reply.knowledge);
                self.knowledge_offset = 0;
                let message = self
                    .conversation
                    .new_message(reply.utterance, true, turn.query_type);
                self.conversation.append(message);
                tracing::info!(turn = turn.id, "turn answered");
                TurnOutcome::Answered
            }
            Err(err) => {
                tracing::error!(turn = turn.id, error = %err, "turn failed");
                self.alert = Some(format!("Error: {err} please try again later"));
                TurnOutcome::Failed
            }
        }
    }

    /// Abandon the in-flight turn, if any. Its reply will be ignored.
    pub fn cancel(&mut self) {
        if let Some(id) = self.in_flight.take() {
            tracing::info!(turn = id, "turn cancelled");
            self.scroll_to_bottom();
        }
    }

    /// Submit the current input, wait for `client`, and apply the reply.
    pub async fn run_turn<C>(&mut self, client: &C) -> Result<TurnOutcome, SessionError>
    where
        C: Consult + ?Sized,
    {
        let turn = self.submit()?;
        let result = client
            .consult(&turn.input, &turn.history, turn.query_type)
            .await;
        Ok(self.resolve(&turn, result))
    }
}
