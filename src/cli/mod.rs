//! CLI module for LearnOS Buddy
//!
//! Handles command-line argument parsing and configuration management.

pub mod args;
pub mod config;

pub use args::{Args, Commands, Verbosity};
pub use config::{Config, EmbeddingBackend, IndexBackend};
