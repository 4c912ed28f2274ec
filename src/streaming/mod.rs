//! Completion streaming module
//!
//! Provides the OpenAI-compatible chat client, an incremental SSE parser
//! and the accumulator that turns deltas into cumulative responses.

pub mod accumulator;
pub mod client;
pub mod parser;

// Re-export commonly used types
pub use accumulator::{accumulate, stream_completion};
pub use client::{ChatCompletion, FragmentStream, OpenAiCompletionClient, DEFAULT_COMPLETION_URL, DEFAULT_MODEL};
pub use parser::{SseParser, MAX_BUFFER_SIZE};
