//! The two faces of a channel

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::shared::Shared;
use crate::error::{StreamError, TrySendError};
use crate::signal::Signal;
use crate::sink::Sink;
use crate::source::Source;

/// Send side of a channel
///
/// Cloning is allowed so a runner can keep a handle for completion, but the
/// channel assumes a single active sender. When the last sink is dropped
/// without completing, the channel completes with [`StreamError::SinkDropped`].
pub struct ChannelSink<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> ChannelSink<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>) -> Self {
        Self { shared }
    }

    /// True once completed or closed from the receiving side
    pub fn is_complete(&self) -> bool {
        self.shared.is_send_closed()
    }

    /// Send, waiting for room (or, in rendezvous mode, for a receiver)
    ///
    /// Fails with `Closed` once the channel is complete or closed, and with
    /// `Cancelled` when the channel's cancellation token fires.
    pub async fn send(&self, item: T) -> Result<(), StreamError> {
        self.shared.send(item).await
    }

    /// Like [`send`](Self::send) but fails with `Timeout` after `timeout`
    pub async fn send_timeout(&self, item: T, timeout: Duration) -> Result<(), StreamError> {
        self.shared.send_timeout(item, timeout).await
    }

    /// Send without waiting
    pub fn try_send(&self, item: T) -> Result<(), TrySendError<T>> {
        self.shared.try_send(item)
    }

    pub fn complete(&self) {
        self.shared.complete_with(crate::signal::Completion::Success);
    }

    pub fn complete_exceptionally(&self, cause: StreamError) {
        self.shared.complete_with(crate::signal::Completion::Failed(cause));
    }

    /// The token that aborts blocked sends on this channel
    pub fn cancellation(&self) -> &CancellationToken {
        self.shared.cancellation()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }
}

impl<T> Clone for ChannelSink<T> {
    fn clone(&self) -> Self {
        self.shared.add_sink();
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Drop for ChannelSink<T> {
    fn drop(&mut self) {
        self.shared.release_sink();
    }
}

impl<T> fmt::Debug for ChannelSink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSink")
            .field("capacity", &self.shared.capacity())
            .field("complete", &self.shared.is_send_closed())
            .finish()
    }
}

#[async_trait]
impl<T: Send + 'static> Sink<T> for ChannelSink<T> {
    fn is_complete(&self) -> bool {
        ChannelSink::is_complete(self)
    }

    async fn send(&self, item: T) -> Result<(), StreamError> {
        ChannelSink::send(self, item).await
    }

    async fn send_timeout(&self, item: T, timeout: Duration) -> Result<(), StreamError> {
        ChannelSink::send_timeout(self, item, timeout).await
    }

    fn try_send(&self, item: T) -> Result<(), TrySendError<T>> {
        ChannelSink::try_send(self, item)
    }

    fn complete(&self) {
        ChannelSink::complete(self)
    }

    fn complete_exceptionally(&self, cause: StreamError) {
        ChannelSink::complete_exceptionally(self, cause)
    }
}

/// Receive side of a channel
///
/// Dropping it closes the channel, so a blocked sender wakes with `Closed`.
pub struct ChannelSource<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> ChannelSource<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>) -> Self {
        Self { shared }
    }

    /// Receive the next item, waiting while the channel is empty
    ///
    /// Buffered items always come before the completion signal. Observing
    /// completion closes the receive side; after that this fails with
    /// `Closed`.
    pub async fn receive(&self) -> Result<Signal<T>, StreamError> {
        self.shared.receive().await
    }

    /// Like [`receive`](Self::receive) but fails with `Timeout` after `timeout`
    pub async fn receive_timeout(&self, timeout: Duration) -> Result<Signal<T>, StreamError> {
        self.shared.receive_timeout(timeout).await
    }

    /// Receive without waiting; `Ok(None)` when nothing is available yet.
    ///
    /// Once the source is closed, by [`close`](Self::close) or after the
    /// end signal was taken, this returns `Err(Closed)` instead.
    pub fn try_receive(&self) -> Result<Option<Signal<T>>, StreamError> {
        self.shared.try_receive()
    }

    /// Close the receive side and discard buffered items; idempotent
    pub fn close(&self) {
        self.shared.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_receive_closed()
    }

    pub fn completion_error(&self) -> Option<StreamError> {
        self.shared.completion().and_then(|c| c.error().cloned())
    }

    /// Number of buffered items
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }
}

impl<T> Drop for ChannelSource<T> {
    fn drop(&mut self) {
        self.shared.close();
    }
}

impl<T> fmt::Debug for ChannelSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSource")
            .field("capacity", &self.shared.capacity())
            .field("buffered", &self.shared.len())
            .field("closed", &self.shared.is_receive_closed())
            .finish()
    }
}

#[async_trait]
impl<T: Send + 'static> Source for ChannelSource<T> {
    type Item = T;

    fn is_closed(&self) -> bool {
        ChannelSource::is_closed(self)
    }

    fn completion_error(&self) -> Option<StreamError> {
        ChannelSource::completion_error(self)
    }

    async fn receive(&mut self) -> Result<Signal<T>, StreamError> {
        ChannelSource::receive(self).await
    }

    async fn close(&mut self) {
        ChannelSource::close(self)
    }
}
