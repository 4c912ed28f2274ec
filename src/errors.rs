//! Error types for LearnOS Buddy
//!
//! One taxonomy for the whole turn pipeline. Configuration problems are
//! fatal at startup, provider and stream failures end the current turn.

use thiserror::Error;

/// Main error type for the retrieval and chat pipeline
#[derive(Error, Debug)]
pub enum BuddyError {
    /// Missing or invalid credentials, endpoints or settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding or vector index call failed
    #[error("{provider} provider error: {message}")]
    Provider { provider: String, message: String },

    /// Completion stream failed to start or aborted mid-flight
    #[error("Streaming error: {0}")]
    Stream(String),

    /// Input rejected before any remote call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Turn state machine transition errors
    #[error("Invalid state transition from {from:?} to {to:?}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

impl BuddyError {
    /// Build a provider error for the named backend
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        BuddyError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, BuddyError::Config(_))
    }

    /// True for embedding and index failures, including raw transport errors
    pub fn is_provider(&self) -> bool {
        matches!(self, BuddyError::Provider { .. } | BuddyError::Http(_))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, BuddyError::Stream(_))
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, BuddyError>;

/// Convert anyhow errors to BuddyError
impl From<anyhow::Error> for BuddyError {
    fn from(err: anyhow::Error) -> Self {
        BuddyError::Generic(err.to_string())
    }
}

/// Pull a readable message out of a provider error body
///
/// Understands `{"error":{"message":..}}`, `{"error":".."}` and
/// `{"message":".."}`; anything else is returned as-is.
pub(crate) fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|value| {
        value
            .pointer("/error/message")
            .or_else(|| value.get("error"))
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    });

    match message {
        Some(message) => message,
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = BuddyError::provider("Pinecone", "HTTP 401: invalid api key");
        let text = err.to_string();
        assert!(text.contains("Pinecone"));
        assert!(text.contains("401"));
        assert!(err.is_provider());
        assert!(!err.is_stream());
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = BuddyError::InvalidTransition {
            from: "Streaming".to_string(),
            to: "Retrieving".to_string(),
            reason: "Cannot go backwards".to_string(),
        };
        assert!(err.to_string().contains("Streaming"));
        assert!(err.to_string().contains("Retrieving"));
    }

    #[test]
    fn test_classification() {
        assert!(BuddyError::Config("missing key".into()).is_config());
        assert!(BuddyError::Stream("connection reset".into()).is_stream());
        assert!(!BuddyError::InvalidInput("empty".into()).is_provider());
    }

    #[test]
    fn test_from_anyhow() {
        let err: BuddyError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, BuddyError::Generic(ref m) if m == "boom"));
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"code":400,"message":"API key not valid"}}"#),
            "API key not valid"
        );
        assert_eq!(error_message(r#"{"error":"quota exceeded"}"#), "quota exceeded");
        assert_eq!(error_message(r#"{"message":"Not Found"}"#), "Not Found");
        assert_eq!(error_message("upstream timeout"), "upstream timeout");
        assert_eq!(error_message(""), "empty response body");
    }
}
