//! In-process fake providers for unit tests

use async_trait::async_trait;
use futures_util::stream;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::conversation::engine::{ChatEngine, Dependencies};
use crate::embedding::EmbeddingProvider;
use crate::errors::{BuddyError, Result};
use crate::index::{IndexMatch, VectorIndex};
use crate::streaming::{ChatCompletion, FragmentStream};
use crate::types::ChatMessage;

#[derive(Clone)]
pub struct FakeEmbedder {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl FakeEmbedder {
    pub fn ok() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BuddyError::provider("Gemini", "HTTP 503: backend unavailable"));
        }
        Ok(vec![0.25; 4])
    }

    fn model(&self) -> &str {
        "fake-embedding"
    }
}

pub struct FakeIndex {
    matches: Vec<IndexMatch>,
}

impl FakeIndex {
    pub fn with_texts(texts: &[&str]) -> Self {
        let matches = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let metadata = json!({ "text": text }).as_object().cloned().unwrap_or_default();
                IndexMatch::new(format!("doc-{}", i), 1.0 - i as f32 * 0.1, metadata)
            })
            .collect();
        Self { matches }
    }
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<IndexMatch>> {
        Ok(self.matches.clone())
    }

    fn name(&self) -> &str {
        "fake-index"
    }
}

/// Scripted completion: fixed deltas, optionally failing at start or at the end
pub struct FakeCompletion {
    parts: Vec<String>,
    fail_start: bool,
    fail_after: bool,
    requests: Arc<std::sync::Mutex<Vec<Vec<ChatMessage>>>>,
}

impl FakeCompletion {
    pub fn with_parts(parts: &[&str]) -> Self {
        Self {
            parts: parts.iter().map(|p| p.to_string()).collect(),
            fail_start: false,
            fail_after: false,
            requests: Arc::default(),
        }
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::with_parts(&[])
        }
    }

    pub fn failing_after(parts: &[&str]) -> Self {
        Self {
            fail_after: true,
            ..Self::with_parts(parts)
        }
    }

    pub fn requests(&self) -> Arc<std::sync::Mutex<Vec<Vec<ChatMessage>>>> {
        self.requests.clone()
    }
}

#[async_trait]
impl ChatCompletion for FakeCompletion {
    async fn stream_chat(&self, messages: &[ChatMessage], _model: &str) -> Result<FragmentStream> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }
        if self.fail_start {
            return Err(BuddyError::Stream("HTTP 401: invalid api key".to_string()));
        }

        let mut items: Vec<Result<String>> = self.parts.iter().cloned().map(Ok).collect();
        if self.fail_after {
            items.push(Err(BuddyError::Stream("connection reset by peer".to_string())));
        }
        Ok(Box::pin(stream::iter(items)))
    }
}

pub fn engine_with(embedder: FakeEmbedder, index: FakeIndex, completion: FakeCompletion) -> ChatEngine {
    let deps = Dependencies::new(Arc::new(embedder), Arc::new(index), Arc::new(completion));
    ChatEngine::new(Arc::new(deps))
}
