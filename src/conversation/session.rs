//! Chat session
//!
//! Owns one conversation's history and drives turns through the state
//! machine. A turn is recorded only when it reaches Done.

use futures_util::StreamExt;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::conversation::engine::{ensure_message, ChatEngine};
use crate::conversation::state::{TurnEvent, TurnState};
use crate::errors::BuddyError;
use crate::types::{ConversationTurn, History};

/// A finished turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Final cumulative answer, now the last history entry
    pub response: String,

    /// Context that was injected into the system message
    pub context: String,
}

/// Why a turn did not complete
#[derive(Error, Debug)]
pub enum TurnError {
    /// Refused before any remote call (empty message, bad state)
    #[error("{0}")]
    Rejected(BuddyError),

    /// Embedding or index failure; nothing was streamed
    #[error("Could not search the notes: {0}")]
    Retrieval(BuddyError),

    /// Completion failed; `partial` is what had been shown so far
    #[error("Answer incomplete: {source}")]
    Stream {
        #[source]
        source: BuddyError,
        partial: String,
    },
}

impl TurnError {
    /// Text already rendered before the failure
    pub fn partial(&self) -> Option<&str> {
        match self {
            TurnError::Stream { partial, .. } if !partial.is_empty() => Some(partial),
            _ => None,
        }
    }

    pub fn inner(&self) -> &BuddyError {
        match self {
            TurnError::Rejected(e) | TurnError::Retrieval(e) => e,
            TurnError::Stream { source, .. } => source,
        }
    }
}

/// One user's conversation
pub struct ChatSession {
    id: Uuid,
    engine: ChatEngine,
    history: History,
    state: TurnState,
    last_context: Option<String>,
    turns_started: usize,
}

impl ChatSession {
    pub fn new(engine: ChatEngine) -> Self {
        Self::with_history(engine, History::new())
    }

    /// Resume from history supplied by the caller
    pub fn with_history(engine: ChatEngine, history: History) -> Self {
        Self {
            id: Uuid::new_v4(),
            engine,
            history,
            state: TurnState::Idle,
            last_context: None,
            turns_started: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Context retrieved for the most recent turn that got that far
    pub fn last_context(&self) -> Option<&str> {
        self.last_context.as_deref()
    }

    pub fn engine(&self) -> &ChatEngine {
        &self.engine
    }

    /// Forget the conversation; the session id is kept
    pub fn reset(&mut self) {
        self.history.clear();
        self.last_context = None;
        self.state = TurnState::Idle;
        info!(session = %self.id, "conversation reset");
    }

    /// Run one turn, calling `render` with each cumulative answer
    pub async fn respond<F>(&mut self, message: &str, render: F) -> Result<TurnOutcome, TurnError>
    where
        F: FnMut(&str) + Send,
    {
        if self.state.is_terminal() {
            self.advance(TurnEvent::Reset).map_err(TurnError::Rejected)?;
        }
        ensure_message(message).map_err(TurnError::Rejected)?;

        self.turns_started += 1;
        let span = info_span!("turn", session = %self.id, turn = self.turns_started);
        self.run_turn(message, render).instrument(span).await
    }

    async fn run_turn<F>(&mut self, message: &str, mut render: F) -> Result<TurnOutcome, TurnError>
    where
        F: FnMut(&str) + Send,
    {
        self.advance(TurnEvent::Submit).map_err(TurnError::Rejected)?;
        debug!(chars = message.len(), "retrieving context");

        let context = match self.engine.retrieve(message).await {
            Ok(context) => context,
            Err(e) => {
                warn!(error = %e, "retrieval failed");
                self.fail(TurnEvent::ProviderFailure);
                return Err(TurnError::Retrieval(e));
            }
        };
        self.last_context = Some(context.clone());
        self.advance(TurnEvent::ContextReady).map_err(TurnError::Rejected)?;

        let messages = self.engine.compose(&context, &self.history, message);
        self.advance(TurnEvent::PromptReady).map_err(TurnError::Rejected)?;
        debug!(messages = messages.len(), "streaming answer");

        let mut response = String::new();
        let mut stream = Box::pin(self.engine.stream_messages(messages));
        while let Some(value) = stream.next().await {
            match value {
                Ok(value) => {
                    render(&value);
                    response = value;
                }
                Err(e) => {
                    warn!(error = %e, partial_chars = response.len(), "stream aborted");
                    self.fail(TurnEvent::StreamFailure);
                    return Err(TurnError::Stream {
                        source: e,
                        partial: response,
                    });
                }
            }
        }

        self.advance(TurnEvent::StreamComplete).map_err(TurnError::Rejected)?;
        self.history.push(ConversationTurn::new(message, response.clone()));
        info!(chars = response.len(), history = self.history.len(), "turn complete");

        Ok(TurnOutcome { response, context })
    }

    fn advance(&mut self, event: TurnEvent) -> crate::errors::Result<()> {
        self.state = self.state.transition(event)?;
        Ok(())
    }

    fn fail(&mut self, event: TurnEvent) {
        if let Err(e) = self.advance(event) {
            warn!(error = %e, "unexpected state on failure");
            self.state = TurnState::Failed;
        }
    }
}
