//! Sink trait definition

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{StreamError, TrySendError};

/// Producer-facing push interface
///
/// A Sink accepts items until it is complete, either because the producer
/// called [`complete`](Sink::complete) or
/// [`complete_exceptionally`](Sink::complete_exceptionally), or because the
/// consumer closed the receiving side.
#[async_trait]
pub trait Sink<T: Send + 'static>: Send + Sync {
    /// True once it is no longer possible to send
    fn is_complete(&self) -> bool;

    /// Send, waiting until the item can be accepted
    async fn send(&self, item: T) -> Result<(), StreamError>;

    /// Send, waiting at most `timeout` for the item to be accepted
    async fn send_timeout(&self, item: T, timeout: Duration) -> Result<(), StreamError>;

    /// Send without waiting; the item is handed back on failure
    fn try_send(&self, item: T) -> Result<(), TrySendError<T>>;

    /// Mark the stream as finished; first completion wins
    fn complete(&self);

    /// Mark the stream as failed with `cause`; first completion wins
    fn complete_exceptionally(&self, cause: StreamError);
}
