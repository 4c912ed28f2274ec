//! Turn engine
//!
//! Holds the process-lifetime provider clients and runs the three turn
//! stages: retrieve, compose, stream. Stateless; history lives with the
//! caller.

use futures_util::Stream;
use std::sync::Arc;
use tracing::info;

use crate::cli::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::errors::{BuddyError, Result};
use crate::index::{self, VectorIndex};
use crate::rag::{KnowledgeRetriever, PromptComposer, DEFAULT_TOP_K};
use crate::streaming::{stream_completion, ChatCompletion, OpenAiCompletionClient, DEFAULT_MODEL};
use crate::types::{ChatMessage, History};

/// Provider clients and turn settings, built once at startup
pub struct Dependencies {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub index: Arc<dyn VectorIndex>,
    pub completion: Arc<dyn ChatCompletion>,
    pub composer: PromptComposer,
    pub model: String,
    pub top_k: usize,
}

impl Dependencies {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        completion: Arc<dyn ChatCompletion>,
    ) -> Self {
        Self {
            embedder,
            index,
            completion,
            composer: PromptComposer::default(),
            model: DEFAULT_MODEL.to_string(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Connect every provider named in `config`
    pub async fn from_config(config: &Config) -> Result<Self> {
        let embedder = embedding::from_config(&config.embedding)?;
        let index = index::from_config(&config.index).await?;
        let completion: Arc<dyn ChatCompletion> =
            Arc::new(OpenAiCompletionClient::from_config(&config.completion)?);

        info!(
            embedding_model = embedder.model(),
            index = index.name(),
            model = %config.completion.model,
            top_k = config.index.top_k,
            "providers ready"
        );

        Ok(Self::new(embedder, index, completion)
            .with_model(&config.completion.model)
            .with_top_k(config.index.top_k))
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_composer(mut self, composer: PromptComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn retriever(&self) -> KnowledgeRetriever {
        KnowledgeRetriever::new(self.embedder.clone(), self.index.clone()).with_top_k(self.top_k)
    }
}

/// Output of the retrieve and compose stages
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTurn {
    pub query: String,
    pub context: String,
    pub messages: Vec<ChatMessage>,
}

/// Cheap to clone; every clone shares the same clients
#[derive(Clone)]
pub struct ChatEngine {
    deps: Arc<Dependencies>,
}

impl ChatEngine {
    pub fn new(deps: Arc<Dependencies>) -> Self {
        Self { deps }
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.deps
    }

    pub fn model(&self) -> &str {
        &self.deps.model
    }

    /// Knowledge for `message`; empty string when nothing matched
    pub async fn retrieve(&self, message: &str) -> Result<String> {
        self.deps.retriever().retrieve(message).await
    }

    pub fn compose(&self, context: &str, history: &History, message: &str) -> Vec<ChatMessage> {
        self.deps.composer.build_messages(context, history, message)
    }

    /// Retrieve then compose; empty messages are rejected first
    pub async fn prepare_turn(&self, message: &str, history: &History) -> Result<PreparedTurn> {
        ensure_message(message)?;
        let context = self.retrieve(message).await?;
        let messages = self.compose(&context, history, message);

        Ok(PreparedTurn {
            query: message.to_string(),
            context,
            messages,
        })
    }

    /// Cumulative answer for a prepared turn
    pub fn stream_turn(&self, prepared: &PreparedTurn) -> impl Stream<Item = Result<String>> + Send {
        self.stream_messages(prepared.messages.clone())
    }

    pub fn stream_messages(&self, messages: Vec<ChatMessage>) -> impl Stream<Item = Result<String>> + Send {
        stream_completion(self.deps.completion.clone(), messages, self.deps.model.clone())
    }
}

/// Whitespace-only messages never reach a provider
pub fn ensure_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(BuddyError::InvalidInput("message is empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::testing::{engine_with, FakeCompletion, FakeEmbedder, FakeIndex};
    use crate::types::{ConversationTurn, Role};
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_prepare_turn_builds_messages() {
        let engine = engine_with(
            FakeEmbedder::ok(),
            FakeIndex::with_texts(&["Deadlock: circular wait", "Banker's algorithm"]),
            FakeCompletion::with_parts(&["ok"]),
        );
        let history = History::from(vec![ConversationTurn::new("hi", "hello!")]);

        let prepared = engine.prepare_turn("What is a deadlock?", &history).await.unwrap();
        assert_eq!(prepared.context, "Deadlock: circular wait\n\nBanker's algorithm");
        assert_eq!(prepared.messages.len(), 4);
        assert!(prepared.messages[0].content.contains("Banker's algorithm"));
        assert_eq!(prepared.messages[3].role, Role::User);
        assert_eq!(prepared.messages[3].content, "What is a deadlock?");
    }

    #[tokio::test]
    async fn test_prepare_turn_rejects_empty_message() {
        let embedder = FakeEmbedder::ok();
        let engine = engine_with(embedder.clone(), FakeIndex::with_texts(&[]), FakeCompletion::with_parts(&[]));
        let err = engine.prepare_turn("   ", &History::new()).await.unwrap_err();
        assert!(matches!(err, BuddyError::InvalidInput(_)));
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_stream_turn_is_cumulative() {
        let engine = engine_with(
            FakeEmbedder::ok(),
            FakeIndex::with_texts(&["T1"]),
            FakeCompletion::with_parts(&["Hi", " there", "!"]),
        );
        let prepared = engine.prepare_turn("hello", &History::new()).await.unwrap();
        let values: Vec<String> = engine
            .stream_turn(&prepared)
            .map(|v| v.unwrap())
            .collect()
            .await;
        assert_eq!(values, vec!["Hi", "Hi there", "Hi there!"]);
    }

    #[tokio::test]
    async fn test_top_k_from_dependencies() {
        let index = FakeIndex::with_texts(&["a", "b", "c", "d"]);
        let deps = Dependencies::new(
            Arc::new(FakeEmbedder::ok()),
            Arc::new(index),
            Arc::new(FakeCompletion::with_parts(&[])),
        )
        .with_top_k(2);
        let engine = ChatEngine::new(Arc::new(deps));
        assert_eq!(engine.retrieve("q").await.unwrap(), "a\n\nb");
    }
}
