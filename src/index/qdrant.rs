//! Qdrant vector index client (gRPC)
//!
//! The collection name comes from `index_name`; stored chunk text is read
//! from the `text` payload field like every other backend.

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{PointId, SearchPointsBuilder, Value as QdrantValue};
use qdrant_client::Qdrant;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cli::config::IndexConfig;
use crate::errors::{BuddyError, Result};
use crate::index::{IndexMatch, VectorIndex};

/// Local Qdrant gRPC endpoint
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

const PROVIDER: &str = "Qdrant";

/// Query-only client bound to one collection
pub struct QdrantIndex {
    client: Qdrant,
    url: String,
    collection: String,
}

impl QdrantIndex {
    pub fn new(url: &str, api_key: Option<String>, collection: &str, timeout: Duration) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .api_key(api_key.filter(|key| !key.is_empty()))
            .timeout(timeout)
            .build()
            .map_err(|e| BuddyError::provider(PROVIDER, format!("client setup failed: {}", e)))?;

        info!(%url, %collection, "configured Qdrant collection");
        Ok(Self {
            client,
            url: url.to_string(),
            collection: collection.to_string(),
        })
    }

    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        let api_key = Some(config.api_key.clone());
        Self::new(
            config.host.as_deref().unwrap_or(DEFAULT_QDRANT_URL),
            api_key,
            &config.index_name,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>> {
        let request = SearchPointsBuilder::new(&self.collection, vector.to_vec(), top_k as u64)
            .with_payload(true);

        let response = self.client.search_points(request).await.map_err(|e| {
            warn!(provider = PROVIDER, collection = %self.collection, error = %e, "search failed");
            BuddyError::provider(PROVIDER, format!("search failed: {}", e))
        })?;

        let matches: Vec<IndexMatch> = response
            .result
            .into_iter()
            .map(|point| IndexMatch::new(point_id_to_string(&point.id), point.score, payload_to_map(point.payload)))
            .collect();

        debug!(collection = %self.collection, matches = matches.len(), "search complete");
        Ok(matches)
    }

    fn name(&self) -> &str {
        &self.collection
    }
}

fn payload_to_map(payload: HashMap<String, QdrantValue>) -> Map<String, JsonValue> {
    payload
        .into_iter()
        .filter_map(|(key, value)| qdrant_to_json_value(&value).map(|json| (key, json)))
        .collect()
}

fn qdrant_to_json_value(value: &QdrantValue) -> Option<JsonValue> {
    value.kind.as_ref().and_then(|kind| match kind {
        Kind::NullValue(_) => Some(JsonValue::Null),
        Kind::StringValue(s) => Some(JsonValue::String(s.clone())),
        Kind::IntegerValue(i) => Some(JsonValue::Number((*i).into())),
        Kind::DoubleValue(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number),
        Kind::BoolValue(b) => Some(JsonValue::Bool(*b)),
        Kind::ListValue(list) => Some(JsonValue::Array(
            list.values.iter().filter_map(qdrant_to_json_value).collect(),
        )),
        Kind::StructValue(fields) => Some(JsonValue::Object(
            fields
                .fields
                .iter()
                .filter_map(|(k, v)| qdrant_to_json_value(v).map(|json| (k.clone(), json)))
                .collect(),
        )),
    })
}

fn point_id_to_string(point_id: &Option<PointId>) -> String {
    match point_id.as_ref().and_then(|id| id.point_id_options.as_ref()) {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        None => "unknown".to_string(),
    }
}
