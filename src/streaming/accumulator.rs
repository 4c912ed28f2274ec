//! Cumulative response streaming
//!
//! Turns raw content deltas into a sequence of growing response strings.
//! Each value is the full text so far; empty deltas produce nothing.

use async_stream::try_stream;
use futures_util::{Stream, StreamExt};
use std::sync::Arc;

use crate::errors::Result;
use crate::streaming::client::ChatCompletion;
use crate::types::ChatMessage;

/// Fold deltas into cumulative values; an error ends the sequence
pub fn accumulate<S>(fragments: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = Result<String>> + Send,
{
    try_stream! {
        let mut fragments = Box::pin(fragments);
        let mut response = String::new();

        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            if fragment.is_empty() {
                continue;
            }
            response.push_str(&fragment);
            yield response.clone();
        }
    }
}

/// Stream a completion for `messages` as cumulative response strings
///
/// Lazy: nothing is sent until the stream is first polled. A request that
/// fails to start surfaces as the first (and only) item.
pub fn stream_completion(
    client: Arc<dyn ChatCompletion>,
    messages: Vec<ChatMessage>,
    model: String,
) -> impl Stream<Item = Result<String>> + Send {
    try_stream! {
        let fragments = client.stream_chat(&messages, &model).await?;
        let mut cumulative = Box::pin(accumulate(fragments));

        while let Some(value) = cumulative.next().await {
            let value = value?;
            yield value;
        }
    }
}
