//! Gemini embedding client
//!
//! Endpoint: POST {base}/models/{model}:embedContent

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cli::config::EmbeddingConfig;
use crate::embedding::{check_vector, ensure_text, EmbeddingProvider};
use crate::errors::{error_message, BuddyError, Result};

/// Public Generative Language API
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default embedding model
pub const DEFAULT_GEMINI_MODEL: &str = "text-embedding-004";

const PROVIDER: &str = "Gemini";

/// Gemini `embedContent` client
#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: Option<usize>,
}

impl GeminiEmbedder {
    /// Create client against the public endpoint
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        Self::with_config(DEFAULT_GEMINI_URL, api_key, model, Duration::from_secs(30))
    }

    /// Create client with custom endpoint and timeout
    pub fn with_config(base_url: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BuddyError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.trim_start_matches("models/").to_string(),
            dimensions: None,
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let embedder = Self::with_config(
            config.base_url.as_deref().unwrap_or(DEFAULT_GEMINI_URL),
            &config.api_key,
            config.model(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(embedder.with_dimensions(config.dimensions))
    }

    /// Ask for truncated output and enforce the vector length
    pub fn with_dimensions(mut self, dimensions: Option<usize>) -> Self {
        self.dimensions = dimensions;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:embedContent", self.base_url, self.model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        ensure_text(text)?;
        debug!(provider = PROVIDER, model = %self.model, text_len = text.len(), "embedding query");

        let request = EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: vec![Part { text }],
            },
            output_dimensionality: self.dimensions,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
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

        let parsed: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| BuddyError::provider(PROVIDER, format!("malformed response: {}", e)))?;

        let vector = check_vector(PROVIDER, parsed.embedding.values, self.dimensions)?;
        debug!(provider = PROVIDER, dimensions = vector.len(), "embedding received");
        Ok(vector)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
