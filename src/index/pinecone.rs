//! Pinecone vector index client
//!
//! Data plane: POST https://{host}/query
//! Control plane (host lookup): GET https://api.pinecone.io/indexes/{name}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cli::config::IndexConfig;
use crate::errors::{error_message, BuddyError, Result};
use crate::index::{IndexMatch, VectorIndex};

/// Pinecone control plane
pub const PINECONE_CONTROL_URL: &str = "https://api.pinecone.io";

/// Pinned REST API version
pub const PINECONE_API_VERSION: &str = "2024-07";

const PROVIDER: &str = "Pinecone";

/// Query-only Pinecone client bound to one index host
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    client: Client,
    host_url: String,
    api_key: String,
    index_name: String,
    namespace: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<IndexMatch>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

impl PineconeIndex {
    /// Bind to a known data-plane host
    pub fn with_host(host: &str, api_key: &str, index_name: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BuddyError::Http)?;

        Ok(Self {
            client,
            host_url: normalize_host(host),
            api_key: api_key.to_string(),
            index_name: index_name.to_string(),
            namespace: None,
        })
    }

    /// Connect using the configured host, or look it up by index name
    pub async fn connect(config: &IndexConfig) -> Result<Self> {
        Self::connect_via(config, PINECONE_CONTROL_URL).await
    }

    /// Same as [`connect`](Self::connect) with an explicit control plane URL
    pub async fn connect_via(config: &IndexConfig, control_url: &str) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let host = match &config.host {
            Some(host) => host.clone(),
            None => {
                let index =
                    Self::with_host(control_url, &config.api_key, &config.index_name, timeout)?;
                index.describe_host(control_url).await?
            }
        };

        info!(index = %config.index_name, %host, "connected to Pinecone index");
        let index = Self::with_host(&host, &config.api_key, &config.index_name, timeout)?;
        Ok(index.with_namespace(config.namespace.clone()))
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }

    /// Ask the control plane for this index's data-plane host
    async fn describe_host(&self, control_url: &str) -> Result<String> {
        let url = format!(
            "{}/indexes/{}",
            control_url.trim_end_matches('/'),
            self.index_name
        );
        debug!(%url, "resolving Pinecone index host");

        let response = self
            .client
            .get(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .send()
            .await
            .map_err(|e| BuddyError::provider(PROVIDER, format!("describe index failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BuddyError::provider(
                PROVIDER,
                format!(
                    "describe index '{}' returned HTTP {}: {}",
                    self.index_name,
                    status,
                    error_message(&body)
                ),
            ));
        }

        let description: IndexDescription = response
            .json()
            .await
            .map_err(|e| BuddyError::provider(PROVIDER, format!("malformed index description: {}", e)))?;

        Ok(description.host)
    }

    pub fn host_url(&self) -> &str {
        &self.host_url
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/query", self.host_url))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| BuddyError::provider(PROVIDER, format!("query failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(provider = PROVIDER, %status, index = %self.index_name, "query rejected");
            return Err(BuddyError::provider(
                PROVIDER,
                format!("HTTP {}: {}", status, error_message(&body)),
            ));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| BuddyError::provider(PROVIDER, format!("malformed query response: {}", e)))?;

        debug!(index = %self.index_name, matches = parsed.matches.len(), "query complete");
        Ok(parsed.matches)
    }

    fn name(&self) -> &str {
        &self.index_name
    }
}

/// Hosts from the control plane come without a scheme
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}
