//! Conversation loop
//!
//! Per-turn orchestration: state machine, the engine that runs each stage
//! against shared provider clients, and the session that owns history.

pub mod engine;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{ensure_message, ChatEngine, Dependencies, PreparedTurn};
pub use session::{ChatSession, TurnError, TurnOutcome};
pub use state::{TurnEvent, TurnState};
