//! Embedding client module
//!
//! Turns query text into a fixed-length vector through a hosted provider.
//! Every call is a fresh remote request: no caching, no retries.

pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;

use crate::cli::config::{EmbeddingBackend, EmbeddingConfig};
use crate::errors::{BuddyError, Result};

pub use gemini::GeminiEmbedder;
pub use openai::OpenAiEmbedder;

/// A hosted service mapping text to a numeric vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single non-empty text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier used for requests
    fn model(&self) -> &str;
}

/// Build the configured provider
pub fn from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingBackend::Gemini => Arc::new(GeminiEmbedder::from_config(config)?),
        EmbeddingBackend::OpenAi => Arc::new(OpenAiEmbedder::from_config(config)?),
    };
    Ok(provider)
}

/// Reject empty input before any request is made
pub(crate) fn ensure_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(BuddyError::InvalidInput(
            "cannot embed empty text".to_string(),
        ));
    }
    Ok(())
}

/// Enforce the fixed dimensionality contract on a provider response
pub(crate) fn check_vector(
    provider: &str,
    vector: Vec<f32>,
    expected: Option<usize>,
) -> Result<Vec<f32>> {
    if vector.is_empty() {
        return Err(BuddyError::provider(provider, "response contained an empty vector"));
    }

    if let Some(dims) = expected {
        if vector.len() != dims {
            return Err(BuddyError::provider(
                provider,
                format!(
                    "embedding has {} dimensions, index expects {}",
                    vector.len(),
                    dims
                ),
            ));
        }
    }

    Ok(vector)
}
