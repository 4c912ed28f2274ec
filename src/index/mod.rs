//! Vector index module
//!
//! Nearest-neighbour lookup against a hosted index. Backends return matches
//! in descending similarity order and that order is kept as-is.

pub mod pinecone;
pub mod qdrant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::cli::config::{IndexBackend, IndexConfig};
use crate::errors::Result;

pub use pinecone::PineconeIndex;
pub use qdrant::QdrantIndex;

/// One neighbour returned by the index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl IndexMatch {
    pub fn new(id: impl Into<String>, score: f32, metadata: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            score,
            metadata,
        }
    }

    /// Stored document text
    pub fn text(&self) -> Option<&str> {
        self.metadata.get("text").and_then(Value::as_str)
    }

    /// Link back to the source document, when the indexer stored one
    pub fn source(&self) -> Option<&str> {
        ["source", "link", "url"]
            .iter()
            .find_map(|key| self.metadata.get(*key).and_then(Value::as_str))
    }
}

/// Similarity search over stored vectors with metadata
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top `top_k` neighbours of `vector`, metadata included
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>>;

    /// Index or collection name, for logs
    fn name(&self) -> &str;
}

/// Connect the configured backend
///
/// Pinecone may need a control-plane call to find its data host, so this
/// runs once at startup.
pub async fn from_config(config: &IndexConfig) -> Result<Arc<dyn VectorIndex>> {
    let index: Arc<dyn VectorIndex> = match config.provider {
        IndexBackend::Pinecone => Arc::new(PineconeIndex::connect(config).await?),
        IndexBackend::Qdrant => Arc::new(QdrantIndex::from_config(config)?),
    };
    Ok(index)
}
