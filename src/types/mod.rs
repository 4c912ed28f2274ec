//! Type definitions module
//!
//! Chat messages and conversation history shared by every layer.

pub mod messages;

// Re-export commonly used types
pub use messages::{ChatMessage, ConversationTurn, History, Role};
