//! LearnOS Buddy - Operating Systems tutor
//!
//! Each question is embedded, matched against a vector index of course
//! notes, and answered by a chat-completion model whose reply is streamed
//! back as a growing string.
//!
//! # Architecture
//!
//! - **embedding / index**: remote providers behind async traits
//! - **rag**: retrieval, persona and prompt assembly
//! - **streaming**: SSE parsing and cumulative answer streams
//! - **conversation**: turn state machine and per-session history
//! - **repl / server**: terminal and HTTP shells over the same engine

pub mod errors;
pub mod types;

pub mod embedding;
pub mod index;
pub mod rag;
pub mod streaming;

pub mod conversation;

pub mod cli;
pub mod repl;
pub mod server;
pub mod telemetry;

// Re-export commonly used types
pub use conversation::{ChatEngine, ChatSession, Dependencies, TurnError, TurnOutcome, TurnState};
pub use errors::{BuddyError, Result};
pub use types::{ChatMessage, ConversationTurn, History, Role};
