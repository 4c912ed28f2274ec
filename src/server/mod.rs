//! HTTP shell
//!
//! Stateless chat endpoint: the client sends its history with every request
//! and receives the answer as a server-sent event stream of cumulative values.
//!
//! SSE data cannot carry a carriage return, so `\r\n` and lone `\r` in an
//! answer are sent as `\n`.

use std::convert::Infallible;
use std::time::Duration;

use anyhow::Context;
use async_stream::stream;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::conversation::{ensure_message, ChatEngine, ChatSession};
use crate::types::{ConversationTurn, History};

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,

    /// Completed exchanges, oldest first
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

/// What the turn task reports back to the event stream
#[derive(Debug)]
enum Frame {
    Message(String),
    Done,
    Error(String),
}

impl Frame {
    fn into_event(self) -> Event {
        match self {
            Frame::Message(text) => Event::default().event("message").data(normalize_newlines(&text)),
            Frame::Done => Event::default().event("done").data(""),
            Frame::Error(reason) => Event::default().event("error").data(normalize_newlines(&reason)),
        }
    }
}

/// `Event::data` panics on `\r`; keep the line breaks as `\n`
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

pub fn router(engine: ChatEngine) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .with_state(engine)
}

/// Bind a `host:port` address; host names are resolved, IPv6 hosts need brackets
pub async fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve(engine: ChatEngine, addr: &str) -> anyhow::Result<()> {
    let listener = bind(addr).await?;
    let local = listener.local_addr()?;
    info!("learnos-buddy listening on http://{}", local);

    axum::serve(listener, router(engine)).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn chat(State(engine): State<ChatEngine>, Json(request): Json<ChatRequest>) -> Response {
    if let Err(e) = ensure_message(&request.message) {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()}))).into_response();
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let history = History::from(request.history);
    let message = request.message;

    tokio::spawn(async move {
        let mut session = ChatSession::with_history(engine, history);
        let frames = tx.clone();
        let result = session
            .respond(&message, move |cumulative| {
                let _ = frames.send(Frame::Message(cumulative.to_string()));
            })
            .await;

        let last = match result {
            Ok(_) => Frame::Done,
            Err(e) => {
                warn!(session = %session.id(), error = %e, "chat request failed");
                Frame::Error(e.to_string())
            }
        };
        let _ = tx.send(last);
    });

    Sse::new(frame_stream(rx))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("keepalive"))
        .into_response()
}

fn frame_stream(mut rx: mpsc::UnboundedReceiver<Frame>) -> impl Stream<Item = Result<Event, Infallible>> {
    stream! {
        while let Some(frame) = rx.recv().await {
            let last = !matches!(frame, Frame::Message(_));
            yield Ok(frame.into_event());
            if last {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_history_pairs() {
        let body = r#"{"message":"and paging?","history":[["hi","Hello!"]]}"#;
        let request: ChatRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.message, "and paging?");
        assert_eq!(request.history, vec![ConversationTurn::new("hi", "Hello!")]);
    }

    #[test]
    fn test_chat_request_history_optional() {
        let request: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(request.history.is_empty());
    }

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\r\nb\rc\nd"), "a\nb\nc\nd");
        assert_eq!(normalize_newlines("plain"), "plain");

        // Must not panic inside axum
        let _ = Frame::Message("line\r\nbreak".into()).into_event();
        let _ = Frame::Error("bad\rthing".into()).into_event();
    }

    #[tokio::test]
    async fn test_bind_resolves_host_names() {
        let listener = bind("localhost:0").await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn test_bind_ipv6_loopback() {
        // Hosts without IPv6 cannot bind ::1; the address itself must still parse
        match bind("[::1]:0").await {
            Ok(listener) => assert!(listener.local_addr().unwrap().is_ipv6()),
            Err(e) => assert!(e.to_string().starts_with("failed to bind"), "{}", e),
        }
    }

    #[tokio::test]
    async fn test_serve_accepts_configured_host_name() {
        use crate::cli::config::Config;

        let mut config = Config::default();
        config.server.host = "localhost".to_string();
        config.server.port = 0;

        let engine = crate::conversation::testing::engine_with(
            crate::conversation::testing::FakeEmbedder::ok(),
            crate::conversation::testing::FakeIndex::with_texts(&[]),
            crate::conversation::testing::FakeCompletion::with_parts(&[]),
        );
        let outcome = tokio::time::timeout(
            Duration::from_millis(300),
            serve(engine, &config.listen_addr()),
        )
        .await;
        // Still serving when the timeout fires
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn test_frame_stream_stops_after_done() {
        use futures_util::StreamExt;

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Frame::Message("Hi".into())).unwrap();
        tx.send(Frame::Done).unwrap();
        tx.send(Frame::Message("late".into())).unwrap();

        let events: Vec<_> = frame_stream(rx).collect().await;
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_frame_stream_ends_when_sender_dropped() {
        use futures_util::StreamExt;

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Frame::Message("Hi".into())).unwrap();
        drop(tx);

        let events: Vec<_> = frame_stream(rx).collect().await;
        assert_eq!(events.len(), 1);
    }
}
