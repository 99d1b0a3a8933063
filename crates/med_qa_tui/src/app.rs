//! Application loop: terminal events in, RAG replies in, one frame out per change.
//!
//! Each submitted turn runs as its own tokio task. Only one task exists at a
//! time; its handle is owned here and aborted when the app shuts down.

use std::sync::Arc;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures_util::StreamExt;
use med_qa_client::{
    ChatSession, ClientError, Consult, PendingTurn, RagReply, SessionError, TurnOutcome,
};
use ratatui::backend::Backend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ui;

const SCROLL_STEP: usize = 5;

type Reply = (u64, Result<RagReply, ClientError>);

struct InFlight {
    turn: PendingTurn,
    handle: JoinHandle<()>,
}

pub struct App {
    session: ChatSession,
    client: Arc<dyn Consult>,
    in_flight: Option<InFlight>,
    replies_tx: mpsc::UnboundedSender<Reply>,
    replies_rx: mpsc::UnboundedReceiver<Reply>,
    running: bool,
}

impl App {
    pub fn new(session: ChatSession, client: Arc<dyn Consult>) -> Self {
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        Self {
            session,
            client,
            in_flight: None,
            replies_tx,
            replies_rx,
            running: true,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Main event loop. Returns when the user quits.
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        let mut events = EventStream::new();
        self.session.focus_input();
        terminal.draw(|frame| ui::draw_and_sync(frame, &mut self.session))?;

        while self.running {
            tokio::select! {
                maybe_event = events.next() => match maybe_event {
                    // Only handle Press events (not Release or Repeat)
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key)
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        self.shutdown();
                        return Err(e.into());
                    }
                    None => self.running = false,
                },
                Some((id, result)) = self.replies_rx.recv() => {
                    self.apply_reply(id, result);
                }
            }
            terminal.draw(|frame| ui::draw_and_sync(frame, &mut self.session))?;
        }

        self.shutdown();
        Ok(())
    }

    /// Handle one key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        let quit = key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL));
        if quit {
            self.running = false;
            return;
        }

        // The alert is modal: any other key only dismisses it.
        if self.session.alert().is_some() {
            self.session.dismiss_alert();
            return;
        }

        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Tab => {
                if let Err(e) = self.session.cycle_query_type() {
                    tracing::debug!(error = %e, "mode change ignored");
                }
            }
            KeyCode::F(n @ 1..=3) => {
                if let Err(e) = self.session.apply_template(usize::from(n - 1)) {
                    tracing::debug!(error = %e, "template ignored");
                }
            }
            KeyCode::PageUp => self.session.scroll_up(SCROLL_STEP),
            KeyCode::PageDown => self.session.scroll_down(SCROLL_STEP),
            KeyCode::Up => self.session.scroll_knowledge_up(1),
            KeyCode::Down => self.session.scroll_knowledge_down(1),
            KeyCode::Backspace => self.session.backspace(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.session.insert_char(c)
            }
            _ => {}
        }
    }

    fn submit(&mut self) {
        let turn = match self.session.submit() {
            Ok(turn) => turn,
            Err(SessionError::EmptyInput | SessionError::Busy) => return,
            // Already raised as the alert by the session.
            Err(e) => {
                tracing::debug!(error = %e, "submit rejected");
                return;
            }
        };

        let client = self.client.clone();
        let tx = self.replies_tx.clone();
        let task_turn = turn.clone();
        let handle = tokio::spawn(async move {
            let result = client
                .consult(&task_turn.input, &task_turn.history, task_turn.query_type)
                .await;
            // Receiver gone means the app is shutting down.
            let _ = tx.send((task_turn.id, result));
        });
        self.in_flight = Some(InFlight { turn, handle });
    }

    fn apply_reply(&mut self, id: u64, result: Result<RagReply, ClientError>) -> TurnOutcome {
        match self.in_flight.take() {
            Some(in_flight) if in_flight.turn.id == id => {
                self.session.resolve(&in_flight.turn, result)
            }
            other => {
                self.in_flight = other;
                tracing::debug!(turn = id, "ignoring reply for a turn that is not in flight");
                TurnOutcome::Stale
            }
        }
    }

    /// Wait for the in-flight turn to finish and apply it. `None` if idle.
    pub async fn wait_for_reply(&mut self) -> Option<TurnOutcome> {
        self.in_flight.as_ref()?;
        let (id, result) = self.replies_rx.recv().await?;
        Some(self.apply_reply(id, result))
    }

    /// Abort the in-flight request and stop the loop.
    pub fn shutdown(&mut self) {
        self.running = false;
        if let Some(in_flight) = self.in_flight.take() {
            tracing::info!(turn = in_flight.turn.id, "aborting in-flight request");
            in_flight.handle.abort();
            self.session.cancel();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
    }
}
