//! Per-turn state machine
//!
//! One turn moves strictly forward:
//! Idle -> Retrieving -> Composing -> Streaming -> Done
//! with Failed reachable from Retrieving and Streaming. Composing is
//! offline and has no failure edge. Done and Failed end the turn; only a
//! reset leaves them.

use crate::errors::{BuddyError, Result};
use serde::{Deserialize, Serialize};

/// Turn lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnState {
    /// Waiting for a user message
    Idle,

    /// Embedding the query and searching the index
    Retrieving,

    /// Building the message list
    Composing,

    /// Receiving the completion
    Streaming,

    /// Answer complete and recorded (terminal)
    Done,

    /// Provider or stream failure (terminal)
    Failed,
}

/// Events that drive a turn forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    /// A non-empty user message arrived
    Submit,

    /// Retrieved context is available (possibly empty)
    ContextReady,

    /// Message list is built
    PromptReady,

    /// Provider signalled end of stream
    StreamComplete,

    /// Embedding or index call failed
    ProviderFailure,

    /// Completion stream failed to start or aborted
    StreamFailure,

    /// Prepare for the next turn
    Reset,
}

impl TurnState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Done | TurnState::Failed)
    }

    /// Checked transition
    ///
    /// Valid edges:
    /// 1. Idle       -> Retrieving (Submit)
    /// 2. Retrieving -> Composing  (ContextReady)
    /// 3. Retrieving -> Failed     (ProviderFailure)
    /// 4. Composing  -> Streaming  (PromptReady)
    /// 5. Streaming  -> Done       (StreamComplete)
    /// 6. Streaming  -> Failed     (StreamFailure)
    /// 7. Done | Failed | Idle -> Idle (Reset)
    pub fn transition(&self, event: TurnEvent) -> Result<TurnState> {
        use TurnEvent::*;
        use TurnState::*;

        let next_state = match (self, event) {
            (Idle, Submit) => Retrieving,

            (Retrieving, ContextReady) => Composing,
            (Retrieving, ProviderFailure) => Failed,

            (Composing, PromptReady) => Streaming,

            (Streaming, StreamComplete) => Done,
            (Streaming, StreamFailure) => Failed,

            (Done | Failed | Idle, Reset) => Idle,

            (from, event) => {
                return Err(BuddyError::InvalidTransition {
                    from: format!("{:?}", from),
                    to: format!("(via {:?})", event),
                    reason: format!("No valid transition from {:?} on {:?}", from, event),
                });
            }
        };

        Ok(next_state)
    }

    /// Events accepted in this state
    pub fn valid_events(&self) -> Vec<TurnEvent> {
        use TurnEvent::*;
        use TurnState::*;

        match self {
            Idle => vec![Submit, Reset],
            Retrieving => vec![ContextReady, ProviderFailure],
            Composing => vec![PromptReady],
            Streaming => vec![StreamComplete, StreamFailure],
            Done | Failed => vec![Reset],
        }
    }

    /// Human-readable state name
    pub fn display_name(&self) -> &'static str {
        match self {
            TurnState::Idle => "Idle",
            TurnState::Retrieving => "Searching notes",
            TurnState::Composing => "Preparing prompt",
            TurnState::Streaming => "Answering",
            TurnState::Done => "Done",
            TurnState::Failed => "Failed",
        }
    }
}

impl Default for TurnState {
    fn default() -> Self {
        TurnState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [TurnState; 6] = [
        TurnState::Idle,
        TurnState::Retrieving,
        TurnState::Composing,
        TurnState::Streaming,
        TurnState::Done,
        TurnState::Failed,
    ];

    const ALL_EVENTS: [TurnEvent; 7] = [
        TurnEvent::Submit,
        TurnEvent::ContextReady,
        TurnEvent::PromptReady,
        TurnEvent::StreamComplete,
        TurnEvent::ProviderFailure,
        TurnEvent::StreamFailure,
        TurnEvent::Reset,
    ];

    #[test]
    fn test_happy_path() {
        let mut state = TurnState::Idle;
        for event in [
            TurnEvent::Submit,
            TurnEvent::ContextReady,
            TurnEvent::PromptReady,
            TurnEvent::StreamComplete,
        ] {
            state = state.transition(event).unwrap();
        }
        assert_eq!(state, TurnState::Done);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_failure_edges() {
        assert_eq!(
            TurnState::Retrieving.transition(TurnEvent::ProviderFailure).unwrap(),
            TurnState::Failed
        );
        assert_eq!(
            TurnState::Streaming.transition(TurnEvent::StreamFailure).unwrap(),
            TurnState::Failed
        );
    }

    #[test]
    fn test_composing_cannot_fail() {
        assert!(TurnState::Composing.transition(TurnEvent::ProviderFailure).is_err());
        assert!(TurnState::Composing.transition(TurnEvent::StreamFailure).is_err());
    }

    #[test]
    fn test_no_going_backwards() {
        let result = TurnState::Streaming.transition(TurnEvent::Submit);
        assert!(matches!(result, Err(BuddyError::InvalidTransition { .. })));
    }

    #[test]
    fn test_terminal_states_only_reset() {
        for state in [TurnState::Done, TurnState::Failed] {
            assert_eq!(state.transition(TurnEvent::Reset).unwrap(), TurnState::Idle);
            assert!(state.transition(TurnEvent::Submit).is_err());
        }
    }

    #[test]
    fn test_valid_events_agree_with_transition() {
        for state in ALL_STATES {
            let valid = state.valid_events();
            for event in ALL_EVENTS {
                assert_eq!(
                    state.transition(event).is_ok(),
                    valid.contains(&event),
                    "{:?} on {:?}",
                    state,
                    event
                );
            }
        }
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(TurnState::default(), TurnState::Idle);
        assert!(!TurnState::Idle.is_terminal());
    }
}
