//! Retrieval-augmented prompting
//!
//! - Retriever: query text -> embedding -> nearest chunks -> joined context
//! - Prompt: persona + context + history -> message list
//! - Persona: the LearnOS Buddy instruction template

pub mod persona;
pub mod prompt;
pub mod retriever;

pub use persona::PERSONA_TEMPLATE;
pub use prompt::{build_messages, PromptComposer};
pub use retriever::{join_context, ContextChunk, KnowledgeRetriever, DEFAULT_TOP_K};
