//! Stream error types

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by channels, sources and producers
///
/// Cloneable so that a completion cause recorded by the producer side can be
/// handed to the consumer (and still be queried afterwards).
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    #[error("Channel closed")]
    Closed,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Producer cancelled")]
    Cancelled,

    #[error("Sink dropped without completing")]
    SinkDropped,

    #[error("IO error: {0}")]
    Io(Arc<io::Error>),

    #[error("Unexpected error: {0}")]
    Unexpected(Arc<dyn StdError + Send + Sync + 'static>),
}

impl StreamError {
    /// Wrap an arbitrary error as an unexpected producer failure
    pub fn unexpected<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        StreamError::Unexpected(Arc::new(err))
    }

    /// Unexpected failure carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        StreamError::Unexpected(Arc::new(MessageError(message.into())))
    }

    /// Check if this error means the channel side was already closed
    pub fn is_closed(&self) -> bool {
        matches!(self, StreamError::Closed)
    }

    /// Check if this error is a cancellation (teardown) signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamError::Cancelled)
    }

    /// Check if this error is retryable
    ///
    /// Only an expired bounded wait is safe to retry; nothing else is.
    pub fn is_retryable(&self) -> bool {
        match self {
            StreamError::Timeout(_) => true,
            StreamError::Closed => false,
            StreamError::Cancelled => false,
            StreamError::SinkDropped => false,
            StreamError::Io(_) => false,
            StreamError::Unexpected(_) => false,
        }
    }

    /// Downcast the wrapped cause of an `Unexpected` or `Io` error
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            StreamError::Unexpected(err) => err.downcast_ref::<E>(),
            StreamError::Io(err) => (err.as_ref() as &(dyn StdError + 'static)).downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        StreamError::Io(Arc::new(err))
    }
}

/// Plain message error used by [`StreamError::message`]
#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for MessageError {}

/// Error returned by a non-blocking send, handing the item back
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrySendError<T> {
    #[error("Channel full")]
    Full(T),

    #[error("Channel closed")]
    Closed(T),
}

impl<T> TrySendError<T> {
    /// Recover the item that could not be sent
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(item) => item,
            TrySendError::Closed(item) => item,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, TrySendError::Full(_))
    }
}
