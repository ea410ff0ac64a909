//! Source trait and pull-style source building blocks
//!
//! [`Source`] is the consumer-facing contract. [`PullSource`] implements the
//! receive loop, error recording and lifecycle for anything that can produce
//! items one at a time through an [`ItemReader`].

use async_trait::async_trait;
use tracing::debug;

use crate::active::ActiveSource;
use crate::error::StreamError;
use crate::producer::SourceProducer;
use crate::signal::{Completion, Signal};

/// Consumer-facing pull interface
#[async_trait]
pub trait Source: Send {
    type Item: Send + 'static;

    /// True once the source no longer yields items, whether it was closed by
    /// the consumer or ran to completion
    fn is_closed(&self) -> bool;

    /// The cause, if the source completed with an error
    fn completion_error(&self) -> Option<StreamError>;

    /// Receive the next item or learn that the stream ended
    ///
    /// Returns `Err(cause)` if the producing side failed, and
    /// `Err(StreamError::Closed)` once the end has already been observed or
    /// the source was closed.
    async fn receive(&mut self) -> Result<Signal<Self::Item>, StreamError>;

    /// Close from the receiving side, releasing upstream resources
    async fn close(&mut self);
}

/// Conversions available on every [`Source`]
pub trait SourceExt: Source + Sized + 'static {
    /// Turn this pull-style source into a push-style producer
    fn into_producer(self) -> SourceProducer<Self> {
        SourceProducer::new(self)
    }

    /// Prefetch this source's items on an independent task
    fn activate(self) -> ActiveSource<Self::Item> {
        ActiveSource::from_source(self)
    }
}

impl<S: Source + 'static> SourceExt for S {}

/// Reads one item at a time for a [`PullSource`]
#[async_trait]
pub trait ItemReader: Send {
    type Item: Send + 'static;

    /// Read the next item, `Ok(None)` at a clean end of input
    async fn read_item(&mut self) -> Result<Option<Self::Item>, StreamError>;

    /// Release the underlying input; called once when the source closes
    async fn release(&mut self) {}
}

/// A [`Source`] driven by an [`ItemReader`]
///
/// The first end or failure closes the source; the cause stays available
/// through [`Source::completion_error`].
pub struct PullSource<R> {
    reader: R,
    name: String,
    completion: Option<Completion>,
    closed: bool,
}

impl<R: ItemReader> PullSource<R> {
    pub fn new(reader: R) -> Self {
        Self::named(reader, short_type_name::<R>())
    }

    /// Create a source with a name used in log output
    pub fn named(reader: R, name: impl Into<String>) -> Self {
        let name = name.into();
        debug!(%name, "PullSource::named: called");
        Self {
            reader,
            name,
            completion: None,
            closed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    async fn finish(&mut self, completion: Completion) {
        debug!(name = %self.name, ?completion, "PullSource::finish: called");
        self.completion = Some(completion);
        self.closed = true;
        self.reader.release().await;
    }
}

#[async_trait]
impl<R: ItemReader> Source for PullSource<R> {
    type Item = R::Item;

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn completion_error(&self) -> Option<StreamError> {
        self.completion.as_ref().and_then(|c| c.error().cloned())
    }

    async fn receive(&mut self) -> Result<Signal<R::Item>, StreamError> {
        if self.closed {
            debug!(name = %self.name, "PullSource::receive: already closed");
            return Err(StreamError::Closed);
        }

        match self.reader.read_item().await {
            Ok(Some(item)) => Ok(Signal::Item(item)),
            Ok(None) => {
                debug!(name = %self.name, "PullSource::receive: source ended");
                self.finish(Completion::Success).await;
                Ok(Signal::EndOfStream)
            }
            Err(StreamError::Cancelled) => Err(StreamError::Cancelled),
            Err(e) => {
                debug!(name = %self.name, error = %e, "PullSource::receive: source failed");
                self.finish(Completion::Failed(e.clone())).await;
                Err(e)
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        debug!(name = %self.name, "PullSource::close: called");
        self.closed = true;
        self.reader.release().await;
    }
}

/// [`ItemReader`] over an iterator of results
pub struct IterReader<T> {
    iter: Box<dyn Iterator<Item = Result<T, StreamError>> + Send>,
}

#[async_trait]
impl<T: Send + 'static> ItemReader for IterReader<T> {
    type Item = T;

    async fn read_item(&mut self) -> Result<Option<T>, StreamError> {
        self.iter.next().transpose()
    }
}

/// A source yielding the items of `items`, then ending cleanly
pub fn iter_source<I>(items: I) -> PullSource<IterReader<I::Item>>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    try_iter_source(items.into_iter().map(Ok))
}

/// A source yielding items until the first `Err`, which fails the source
pub fn try_iter_source<I, T>(items: I) -> PullSource<IterReader<T>>
where
    I: IntoIterator<Item = Result<T, StreamError>>,
    I::IntoIter: Send + 'static,
    T: Send + 'static,
{
    PullSource::named(
        IterReader {
            iter: Box::new(items.into_iter()),
        },
        "iter",
    )
}

fn short_type_name<R>() -> String {
    let full = std::any::type_name::<R>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
