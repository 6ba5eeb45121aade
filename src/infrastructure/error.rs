//! Pipeline Error Kinds
//!
//! Every worker classifies a failure into exactly one of these kinds, and
//! the binary's message-handling loop uses that classification to decide
//! between retry, nack-without-requeue (poison), or a plain no-op ack
//! (§7). No other part of the crate panics or lets an error cross a
//! worker boundary unclassified.

use thiserror::Error;

/// A classified pipeline failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Disconnect/timeout against the message bus, metadata store, or
    /// object store. The caller retries with backoff; the message is not
    /// acked until the retry budget is exhausted.
    #[error("transient infrastructure error: {0}")]
    Transient(#[source] anyhow::Error),

    /// Malformed JSON, a missing required field, or an unreadable image.
    /// Logged and nacked without requeue; never retried.
    #[error("message data error: {0}")]
    MessageData(String),

    /// The external embedding model failed to produce a vector. Treated
    /// as a poison message per §4.3.
    #[error("embedding failure: {0}")]
    EmbeddingFailed(String),
}

impl From<mongodb::error::Error> for PipelineError {
    fn from(err: mongodb::error::Error) -> Self {
        PipelineError::Transient(err.into())
    }
}

impl From<lapin::Error> for PipelineError {
    fn from(err: lapin::Error) -> Self {
        PipelineError::Transient(err.into())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::MessageData(err.to_string())
    }
}

impl From<crate::domain::repositories::RepositoryError> for PipelineError {
    fn from(err: crate::domain::repositories::RepositoryError) -> Self {
        PipelineError::Transient(err.into())
    }
}

impl PipelineError {
    /// Whether the message that produced this error should be acked
    /// without requeue (poison) rather than retried.
    pub fn is_poison(&self) -> bool {
        matches!(
            self,
            PipelineError::MessageData(_) | PipelineError::EmbeddingFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_data_errors_are_poison() {
        let err = PipelineError::MessageData("missing field frame_uuid".to_string());
        assert!(err.is_poison());
    }

    #[test]
    fn embedding_failures_are_poison() {
        let err = PipelineError::EmbeddingFailed("model returned no vector".to_string());
        assert!(err.is_poison());
    }

    #[test]
    fn transient_errors_are_not_poison() {
        let err = PipelineError::Transient(anyhow::anyhow!("connection reset"));
        assert!(!err.is_poison());
    }
}
