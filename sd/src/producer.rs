//! Producer trait and the pull-to-push adapter

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::StreamError;
use crate::signal::Signal;
use crate::sink::Sink;
use crate::source::Source;

/// A unit of work that pushes items into a [`Sink`]
///
/// Contract:
/// - on exhaustion call `sink.complete()` and return `Ok(())`
/// - on internal failure call `sink.complete_exceptionally(cause)` and
///   return `Ok(())`
/// - when `cancel` fires, return `Err(StreamError::Cancelled)` without
///   marking completion
///
/// Blocking points inside the producer must honor `cancel`. Sends into a
/// runner-provided sink already do.
#[async_trait]
pub trait Producer<T: Send + 'static>: Send {
    async fn produce(&mut self, sink: &dyn Sink<T>, cancel: &CancellationToken) -> Result<(), StreamError>;
}

/// [`Producer`] that receives from a [`Source`] and sends into the sink
///
/// If the sink is closed from the consumer side before the source is
/// exhausted, the source is closed early so upstream work stops. The source
/// is closed whenever the adapter returns.
pub struct SourceProducer<S> {
    source: S,
}

impl<S: Source> SourceProducer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    async fn pump(&mut self, sink: &dyn Sink<S::Item>, cancel: &CancellationToken) -> Result<(), StreamError> {
        let mut sent = 0u64;
        loop {
            if sink.is_complete() {
                debug!(sent, "SourceProducer::pump: sink closed, stopping source early");
                return Ok(());
            }

            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(sent, "SourceProducer::pump: cancelled while receiving");
                    return Err(StreamError::Cancelled);
                }
                received = self.source.receive() => received,
            };

            match received {
                Ok(Signal::Item(item)) => match sink.send(item).await {
                    Ok(()) => sent += 1,
                    Err(StreamError::Closed) => {
                        debug!(sent, "SourceProducer::pump: sink closed during send, item discarded");
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                },
                Ok(Signal::EndOfStream) => {
                    debug!(sent, "SourceProducer::pump: source ended");
                    sink.complete();
                    return Ok(());
                }
                Err(StreamError::Cancelled) => return Err(StreamError::Cancelled),
                Err(e) => {
                    debug!(sent, error = %e, "SourceProducer::pump: source failed");
                    sink.complete_exceptionally(e);
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait]
impl<S: Source> Producer<S::Item> for SourceProducer<S> {
    async fn produce(&mut self, sink: &dyn Sink<S::Item>, cancel: &CancellationToken) -> Result<(), StreamError> {
        debug!("SourceProducer::produce: called");
        let outcome = self.pump(sink, cancel).await;
        self.source.close().await;
        outcome
    }
}
