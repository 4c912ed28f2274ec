//! Knowledge retriever
//!
//! Embeds the query, asks the index for its nearest neighbours and joins
//! their stored text. Order is whatever the index returned.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::embedding::EmbeddingProvider;
use crate::errors::{BuddyError, Result};
use crate::index::{IndexMatch, VectorIndex};

/// Default number of neighbours per query
pub const DEFAULT_TOP_K: usize = 3;

/// Separator between retrieved chunks
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Text of one retrieved document plus what the index told us about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChunk {
    pub text: String,
    pub source: Option<String>,
    pub score: f32,
}

impl ContextChunk {
    fn from_match(m: IndexMatch, index_name: &str) -> Result<Self> {
        let text = m.text().map(str::to_string).ok_or_else(|| {
            BuddyError::provider(
                index_name,
                format!("match '{}' has no text in its metadata", m.id),
            )
        })?;

        Ok(Self {
            source: m.source().map(str::to_string),
            score: m.score,
            text,
        })
    }
}

/// Join chunk texts with a blank line, preserving order
pub fn join_context(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}

/// Embedding client plus vector index, queried together
#[derive(Clone)]
pub struct KnowledgeRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl KnowledgeRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Context string for `query` using the configured K
    pub async fn retrieve(&self, query: &str) -> Result<String> {
        self.retrieve_with_top_k(query, self.top_k).await
    }

    /// Context string for `query`; empty when nothing matched
    pub async fn retrieve_with_top_k(&self, query: &str, top_k: usize) -> Result<String> {
        let chunks = self.retrieve_chunks(query, top_k).await?;
        Ok(join_context(&chunks))
    }

    /// Ranked chunks for `query`, at most `top_k` of them
    pub async fn retrieve_chunks(&self, query: &str, top_k: usize) -> Result<Vec<ContextChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(query).await?;
        debug!(dimensions = vector.len(), top_k, "query embedded");

        let mut matches = self.index.query(&vector, top_k).await?;
        matches.truncate(top_k);

        let chunks = matches
            .into_iter()
            .map(|m| ContextChunk::from_match(m, self.index.name()))
            .collect::<Result<Vec<_>>>()?;

        info!(index = self.index.name(), chunks = chunks.len(), "context retrieved");
        Ok(chunks)
    }
}
