//! Active source runner
//!
//! An [`ActiveSource`] runs a [`Producer`] on its own task, writing into a
//! private channel, and hands the consumer the channel's receive side. The
//! producer can run ahead of the consumer by up to the channel's capacity.
//!
//! Stopping follows a fixed order: cancel the producer, wait for its task to
//! terminate, then close the channel. Nothing is discarded while the producer
//! may still be writing.

mod builder;
mod executor;
mod state;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

pub use builder::ActiveSourceBuilder;
pub use executor::Executor;
pub use state::RunState;

use crate::channel::{self, ChannelSink, ChannelSource};
use crate::error::StreamError;
use crate::producer::{Producer, SourceProducer};
use crate::signal::Signal;
use crate::source::Source;
use executor::TaskHandle;

/// A [`Source`] backed by a producer running on an independent task
///
/// The producer starts on [`start`](Self::start) or, lazily, on the first
/// receive. Dropping a running source cancels the producer and closes the
/// channel without waiting for the task; call [`stop`](Self::stop) to wait.
pub struct ActiveSource<T: Send + 'static> {
    id: Uuid,
    state: RunState,
    producer: Option<Box<dyn Producer<T>>>,
    sink: Option<ChannelSink<T>>,
    source: ChannelSource<T>,
    cancel: CancellationToken,
    task: Option<TaskHandle>,
    executor: Executor,
}

impl<T: Send + 'static> ActiveSource<T> {
    /// Create an active source with default capacity and executor
    pub fn new(producer: impl Producer<T> + 'static) -> Self {
        Self::builder(producer).build()
    }

    pub fn builder(producer: impl Producer<T> + 'static) -> ActiveSourceBuilder<T> {
        ActiveSourceBuilder::new(Box::new(producer))
    }

    /// Prefetch the items of a pull-style source
    pub fn from_source<S>(source: S) -> Self
    where
        S: Source<Item = T> + 'static,
    {
        Self::new(SourceProducer::new(source))
    }

    pub(crate) fn assemble(producer: Box<dyn Producer<T>>, capacity: usize, executor: Executor) -> Self {
        let id = Uuid::now_v7();
        debug!(%id, capacity, ?executor, "ActiveSource::assemble: called");
        let cancel = CancellationToken::new();
        let (sink, source) = channel::with_cancellation(capacity, cancel.clone());
        Self {
            id,
            state: RunState::New,
            producer: Some(producer),
            sink: Some(sink),
            source,
            cancel,
            task: None,
            executor,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn capacity(&self) -> usize {
        self.source.capacity()
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Spawn the producer; a no-op unless the source is new
    ///
    /// If the task cannot be spawned the failure becomes the stream's
    /// completion, so the consumer sees it on its next receive.
    pub fn start(&mut self) {
        if self.state != RunState::New {
            debug!(id = %self.id, state = %self.state, "ActiveSource::start: not new, ignoring");
            return;
        }
        debug!(id = %self.id, "ActiveSource::start: called");
        self.state = RunState::Running;

        let (Some(producer), Some(sink)) = (self.producer.take(), self.sink.take()) else {
            return;
        };
        // Keeps the channel open if spawning drops the task future
        let reporter = sink.clone();
        let task = run_producer(self.id, producer, sink, self.cancel.clone());

        match self.executor.spawn(task) {
            Ok(handle) => self.task = Some(handle),
            Err(e) => {
                warn!(id = %self.id, error = %e, "ActiveSource::start: failed to spawn producer");
                reporter.complete_exceptionally(e);
            }
        }
    }

    /// Cancel the producer, wait for it to terminate, then close the channel
    ///
    /// Buffered items are discarded. A no-op once stopped.
    pub async fn stop(&mut self) {
        match self.state {
            RunState::Stopped => {
                debug!(id = %self.id, "ActiveSource::stop: already stopped");
                return;
            }
            RunState::New => {
                debug!(id = %self.id, "ActiveSource::stop: never started");
                self.source.close();
                self.producer = None;
                self.sink = None;
            }
            RunState::Running => {
                debug!(id = %self.id, "ActiveSource::stop: cancelling producer");
                self.cancel.cancel();
                if let Some(task) = self.task.take() {
                    task.join().await;
                }
                debug!(id = %self.id, discarded = self.source.len(), "ActiveSource::stop: producer joined");
                self.source.close();
            }
        }
        self.state = RunState::Stopped;
    }

    /// Same as [`stop`](Self::stop)
    pub async fn close(&mut self) {
        self.stop().await;
    }

    /// Receive the next item, starting the producer if needed
    pub async fn receive(&mut self) -> Result<Signal<T>, StreamError> {
        self.start_if_new();
        self.source.receive().await
    }

    pub async fn receive_timeout(&mut self, timeout: Duration) -> Result<Signal<T>, StreamError> {
        self.start_if_new();
        self.source.receive_timeout(timeout).await
    }

    /// Receive without waiting; `Ok(None)` when the producer has not caught up.
    /// After close, stop or a taken end signal this is `Err(Closed)`.
    pub fn try_receive(&mut self) -> Result<Option<Signal<T>>, StreamError> {
        self.start_if_new();
        self.source.try_receive()
    }

    pub fn is_closed(&self) -> bool {
        self.state == RunState::Stopped || self.source.is_closed()
    }

    pub fn completion_error(&self) -> Option<StreamError> {
        self.source.completion_error()
    }

    /// Number of items prefetched and not yet received
    pub fn buffered(&self) -> usize {
        self.source.len()
    }

    fn start_if_new(&mut self) {
        if self.state == RunState::New {
            self.start();
        }
    }
}

impl<T: Send + 'static> Drop for ActiveSource<T> {
    fn drop(&mut self) {
        if self.state.is_running() {
            debug!(id = %self.id, "ActiveSource::drop: cancelling running producer");
            self.cancel.cancel();
        }
        self.source.close();
    }
}

impl<T: Send + 'static> std::fmt::Debug for ActiveSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSource")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("executor", &self.executor)
            .field("source", &self.source)
            .finish()
    }
}

#[async_trait]
impl<T: Send + 'static> Source for ActiveSource<T> {
    type Item = T;

    fn is_closed(&self) -> bool {
        ActiveSource::is_closed(self)
    }

    fn completion_error(&self) -> Option<StreamError> {
        ActiveSource::completion_error(self)
    }

    async fn receive(&mut self) -> Result<Signal<T>, StreamError> {
        ActiveSource::receive(self).await
    }

    async fn close(&mut self) {
        ActiveSource::stop(self).await
    }
}

/// Body of the producer task: run, then record how it ended
async fn run_producer<T: Send + 'static>(
    id: Uuid,
    mut producer: Box<dyn Producer<T>>,
    sink: ChannelSink<T>,
    cancel: CancellationToken,
) {
    debug!(%id, "run_producer: started");
    let outcome = AssertUnwindSafe(producer.produce(&sink, &cancel)).catch_unwind().await;

    match outcome {
        Ok(Ok(())) if cancel.is_cancelled() => {
            debug!(%id, "run_producer: finished after cancellation");
        }
        Ok(Ok(())) => {
            debug!(%id, "run_producer: finished");
            sink.complete();
        }
        Ok(Err(StreamError::Cancelled)) => {
            debug!(%id, "run_producer: cancelled");
        }
        Ok(Err(e)) => {
            debug!(%id, error = %e, "run_producer: failed");
            sink.complete_exceptionally(e);
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!(%id, %message, "run_producer: producer panicked");
            sink.complete_exceptionally(StreamError::message(format!("producer panicked: {}", message)));
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Sink;
    use crate::source::{SourceExt, iter_source};

    struct Counter {
        limit: u32,
    }

    #[async_trait]
    impl Producer<u32> for Counter {
        async fn produce(&mut self, sink: &dyn Sink<u32>, _cancel: &CancellationToken) -> Result<(), StreamError> {
            for i in 0..self.limit {
                sink.send(i).await?;
            }
            sink.complete();
            Ok(())
        }
    }

    struct Panicker;

    #[async_trait]
    impl Producer<u32> for Panicker {
        async fn produce(&mut self, sink: &dyn Sink<u32>, _cancel: &CancellationToken) -> Result<(), StreamError> {
            sink.send(1).await?;
            panic!("boom");
        }
    }

    struct Failing;

    #[async_trait]
    impl Producer<u32> for Failing {
        async fn produce(&mut self, _sink: &dyn Sink<u32>, _cancel: &CancellationToken) -> Result<(), StreamError> {
            Err(StreamError::message("no upstream"))
        }
    }

    #[tokio::test]
    async fn test_lazy_start_on_first_receive() {
        let mut active = ActiveSource::new(Counter { limit: 2 });
        assert_eq!(active.state(), RunState::New);

        assert_eq!(active.receive().await.unwrap(), Signal::Item(0));
        assert_eq!(active.state(), RunState::Running);
        assert_eq!(active.receive().await.unwrap(), Signal::Item(1));
        assert_eq!(active.receive().await.unwrap(), Signal::EndOfStream);
        assert!(active.is_closed());
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let mut active = ActiveSource::new(Counter { limit: 1 });
        active.start();
        active.start();
        assert_eq!(active.receive().await.unwrap(), Signal::Item(0));
        assert_eq!(active.receive().await.unwrap(), Signal::EndOfStream);
    }

    #[tokio::test]
    async fn test_producer_error_becomes_completion() {
        let mut active = ActiveSource::new(Failing);
        let err = active.receive().await.unwrap_err();
        assert!(err.to_string().contains("no upstream"));
        assert!(active.completion_error().is_some());
    }

    #[tokio::test]
    async fn test_panic_becomes_unexpected() {
        let mut active = ActiveSource::builder(Panicker).capacity(4).build();
        assert_eq!(active.receive().await.unwrap(), Signal::Item(1));

        let err = active.receive().await.unwrap_err();
        assert!(matches!(err, StreamError::Unexpected(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_stop_before_start() {
        let mut active = ActiveSource::new(Counter { limit: 3 });
        active.stop().await;

        assert_eq!(active.state(), RunState::Stopped);
        assert!(active.is_closed());
        assert!(active.receive().await.unwrap_err().is_closed());

        // Stopping again is a no-op
        active.stop().await;
        assert_eq!(active.state(), RunState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_discards_prefetched_items() {
        let mut active = iter_source(0..100u32).activate();
        assert_eq!(active.receive().await.unwrap(), Signal::Item(0));

        active.stop().await;
        assert!(active.is_closed());
        assert_eq!(active.buffered(), 0);
        assert!(active.try_receive().unwrap_err().is_closed());
    }

    #[tokio::test]
    async fn test_close_through_source_trait() {
        let mut active = ActiveSource::new(Counter { limit: 5 });
        assert_eq!(active.receive().await.unwrap(), Signal::Item(0));

        Source::close(&mut active).await;
        assert_eq!(active.state(), RunState::Stopped);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let a = ActiveSource::new(Counter { limit: 0 });
        let b = ActiveSource::new(Counter { limit: 0 });
        assert_ne!(a.id(), b.id());
        assert!(format!("{:?}", a).contains("ActiveSource"));
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&"owned".to_string()), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic payload");
    }
}
