//! OpenAI-compatible streaming chat client
//!
//! Endpoint: POST {base}/chat/completions with `stream: true`.
//! The body is a server-sent event stream of `chat.completion.chunk`
//! objects terminated by `data: [DONE]`.
//!
//! The configured timeout bounds connecting, waiting for the response head
//! and each gap between body chunks. A long answer that keeps arriving is
//! never cut off.

use async_stream::try_stream;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::cli::config::CompletionConfig;
use crate::errors::{error_message, BuddyError, Result};
use crate::streaming::parser::SseParser;
use crate::types::ChatMessage;

/// Default completion endpoint
pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Terminal SSE payload
const DONE_MARKER: &str = "[DONE]";

/// Raw content deltas, in arrival order; may contain empty strings
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A provider that streams a chat completion for a message list
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Start a streaming completion; fails with `Stream` if it cannot start
    async fn stream_chat(&self, messages: &[ChatMessage], model: &str) -> Result<FragmentStream>;
}

/// Streaming client for `/v1/chat/completions`
#[derive(Debug, Clone)]
pub struct OpenAiCompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
    idle_timeout: Duration,
}

impl OpenAiCompletionClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_config(DEFAULT_COMPLETION_URL, api_key, Duration::from_secs(120))
    }

    /// Create client with custom endpoint and idle timeout
    pub fn with_config(base_url: &str, api_key: &str, idle_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(idle_timeout)
            .build()
            .map_err(BuddyError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            idle_timeout,
        })
    }

    pub fn from_config(config: &CompletionConfig) -> Result<Self> {
        Self::with_config(
            &config.base_url,
            &config.api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// What one SSE event means for the stream
#[derive(Debug, PartialEq)]
enum ChunkEvent {
    Delta(String),
    Finished(String),
    Done,
}

fn parse_event(data: &str) -> Result<ChunkEvent> {
    if data.trim() == DONE_MARKER {
        return Ok(ChunkEvent::Done);
    }

    let chunk: ChatChunk = serde_json::from_str(data)
        .map_err(|e| BuddyError::Stream(format!("malformed stream chunk: {}", e)))?;

    if let Some(error) = chunk.error {
        return Err(BuddyError::Stream(format!(
            "provider aborted the stream: {}",
            error_message(&error.to_string())
        )));
    }

    let (content, finish_reason) = match chunk.choices.into_iter().next() {
        Some(choice) => (choice.delta.content.unwrap_or_default(), choice.finish_reason),
        None => (String::new(), None),
    };

    Ok(match finish_reason {
        Some(_) => ChunkEvent::Finished(content),
        None => ChunkEvent::Delta(content),
    })
}

/// Next body chunk, failing if none arrives within `idle`
async fn next_chunk<S, E>(body: &mut S, idle: Duration) -> Result<Option<Bytes>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Display,
{
    match timeout(idle, body.next()).await {
        Err(_) => Err(BuddyError::Stream(format!(
            "no data from provider for {}s",
            idle.as_secs_f32()
        ))),
        Ok(None) => Ok(None),
        Ok(Some(Ok(bytes))) => Ok(Some(bytes)),
        Ok(Some(Err(e))) => Err(BuddyError::Stream(format!("connection dropped: {}", e))),
    }
}

/// Decode a streaming response body into content deltas
fn decode_body<S, E>(body: S, idle: Duration) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send,
    E: Display + Send,
{
    try_stream! {
        let mut body = Box::pin(body);
        let mut parser = SseParser::new();
        let mut finished = false;
        let mut done = false;

        'read: while let Some(bytes) = next_chunk(&mut body, idle).await? {
            for data in parser.add_bytes(&bytes)? {
                match parse_event(&data)? {
                    ChunkEvent::Delta(content) => {
                        yield content;
                    }
                    ChunkEvent::Finished(content) => {
                        finished = true;
                        yield content;
                    }
                    ChunkEvent::Done => {
                        done = true;
                        break 'read;
                    }
                }
            }
        }

        if !done {
            if let Some(data) = parser.finish()? {
                match parse_event(&data)? {
                    ChunkEvent::Delta(content) => {
                        yield content;
                    }
                    ChunkEvent::Finished(content) => {
                        finished = true;
                        yield content;
                    }
                    ChunkEvent::Done => done = true,
                }
            }
        }

        if !done && !finished {
            warn!("completion stream closed before end marker");
            Err::<(), _>(BuddyError::Stream(
                "stream ended before the provider signalled completion".to_string(),
            ))?;
        }

        debug!(finished, done, "completion stream closed");
    }
}

#[async_trait]
impl ChatCompletion for OpenAiCompletionClient {
    async fn stream_chat(&self, messages: &[ChatMessage], model: &str) -> Result<FragmentStream> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(%url, model, messages = messages.len(), "starting completion stream");

        let request = ChatRequest {
            model,
            messages,
            stream: true,
        };

        let send = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "text/event-stream")
            .json(&request)
            .send();
        let response = timeout(self.idle_timeout, send)
            .await
            .map_err(|_| BuddyError::Stream("timed out waiting for the provider to respond".to_string()))?
            .map_err(|e| BuddyError::Stream(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "completion request rejected");
            return Err(BuddyError::Stream(format!(
                "HTTP {}: {}",
                status,
                error_message(&body)
            )));
        }

        Ok(Box::pin(decode_body(response.bytes_stream(), self.idle_timeout)))
    }
}
