//! Error types for request construction and dispatch.
//!
//! # Design
//! Every failure a call can hit surfaces as one `CallError`. Timeouts and
//! cancellation get their own variants so callers can tell "the server was
//! slow" apart from "the connection broke". Client implementations wrap
//! their own failures with [`CallError::transport`].

use std::time::Duration;

use thiserror::Error;

/// Boxed error produced by a transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by the call family, the request builder, and clients.
#[derive(Debug, Error)]
pub enum CallError {
    /// The endpoint could not be parsed as an absolute URL.
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The method is not a valid HTTP token.
    #[error("invalid http method {0:?}")]
    InvalidMethod(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The caller's context was cancelled.
    #[error("request canceled")]
    Canceled,

    /// The caller's context deadline had already passed before dispatch.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// No response arrived within the effective deadline.
    #[error("request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The client failed to execute the request.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
}

impl CallError {
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        CallError::Transport(err.into())
    }

    /// True for both the fixed timeout and an expired caller deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CallError::Timeout { .. } | CallError::DeadlineExceeded)
    }
}
