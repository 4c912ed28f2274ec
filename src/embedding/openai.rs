//! OpenAI-compatible embedding client
//!
//! Endpoint: POST {base}/embeddings

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cli::config::EmbeddingConfig;
use crate::embedding::{check_vector, ensure_text, EmbeddingProvider};
use crate::errors::{error_message, BuddyError, Result};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";

const PROVIDER: &str = "OpenAI";

/// Client for `/v1/embeddings` and compatible servers
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: Option<usize>,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        Self::with_config(DEFAULT_OPENAI_URL, api_key, model, Duration::from_secs(30))
    }

    pub fn with_config(base_url: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BuddyError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            dimensions: None,
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let embedder = Self::with_config(
            config.base_url.as_deref().unwrap_or(DEFAULT_OPENAI_URL),
            &config.api_key,
            config.model(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(embedder.with_dimensions(config.dimensions))
    }

    /// Matryoshka truncation; also enforced on the response
    pub fn with_dimensions(mut self, dimensions: Option<usize>) -> Self {
        self.dimensions = dimensions;
        self
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        ensure_text(text)?;
        debug!(provider = PROVIDER, model = %self.model, text_len = text.len(), "embedding query");

        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BuddyError::provider(PROVIDER, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(provider = PROVIDER, %status, "embedding request rejected");
            return Err(BuddyError::provider(
                PROVIDER,
                format!("HTTP {}: {}", status, error_message(&body)),
            ));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| BuddyError::provider(PROVIDER, format!("malformed response: {}", e)))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| BuddyError::provider(PROVIDER, "response contained no embeddings"))?;

        check_vector(PROVIDER, vector, self.dimensions)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
