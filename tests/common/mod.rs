//! Shared in-process providers for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;
use learnos_buddy::embedding::EmbeddingProvider;
use learnos_buddy::index::{IndexMatch, VectorIndex};
use learnos_buddy::streaming::{ChatCompletion, FragmentStream};
use learnos_buddy::{BuddyError, ChatEngine, ChatMessage, Dependencies, Result};
use serde_json::json;

/// Route crate logs through the test harness; safe to call from every test
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("learnos_buddy=debug")
        .with_test_writer()
        .try_init();
}

pub struct StaticEmbedder {
    pub calls: Arc<AtomicUsize>,
    pub fail: bool,
}

impl StaticEmbedder {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl EmbeddingProvider for StaticEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BuddyError::provider("Gemini", "HTTP 500: internal error"));
        }
        Ok(vec![0.1, 0.2, 0.3])
    }

    fn model(&self) -> &str {
        "static"
    }
}

pub struct NotesIndex {
    texts: Vec<String>,
}

impl NotesIndex {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            texts: texts.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[async_trait]
impl VectorIndex for NotesIndex {
    async fn query(&self, _vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>> {
        Ok(self
            .texts
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(i, text)| {
                let metadata = json!({ "text": text }).as_object().cloned().unwrap_or_default();
                IndexMatch::new(format!("note-{}", i), 0.9, metadata)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "os-notes"
    }
}

/// Replays fixed deltas and records every request it receives
pub struct ScriptedCompletion {
    pub parts: Vec<String>,
    pub abort_after: bool,
    pub requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedCompletion {
    pub fn new(parts: &[&str]) -> Self {
        Self {
            parts: parts.iter().map(|p| p.to_string()).collect(),
            abort_after: false,
            requests: Arc::default(),
        }
    }

    pub fn aborting(parts: &[&str]) -> Self {
        Self {
            abort_after: true,
            ..Self::new(parts)
        }
    }
}

#[async_trait]
impl ChatCompletion for ScriptedCompletion {
    async fn stream_chat(&self, messages: &[ChatMessage], _model: &str) -> Result<FragmentStream> {
        self.requests.lock().unwrap().push(messages.to_vec());

        let mut items: Vec<Result<String>> = self.parts.iter().cloned().map(Ok).collect();
        if self.abort_after {
            items.push(Err(BuddyError::Stream("connection dropped".to_string())));
        }
        Ok(Box::pin(stream::iter(items)))
    }
}

pub fn engine(embedder: StaticEmbedder, notes: &[&str], completion: ScriptedCompletion) -> ChatEngine {
    let deps = Dependencies::new(
        Arc::new(embedder),
        Arc::new(NotesIndex::new(notes)),
        Arc::new(completion),
    );
    ChatEngine::new(Arc::new(deps))
}
