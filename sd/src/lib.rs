//! streamduct - Backpressured item streams between async tasks
//!
//! streamduct moves a sequence of values from a producer to a consumer
//! through a closable, bounded channel. Either side can end the stream: the
//! producer by completing (successfully or with an error), the consumer by
//! closing.
//!
//! # Core Concepts
//!
//! - **Backpressure**: a full channel suspends the producer, a zero-capacity
//!   channel pairs every send with a receive
//! - **Ordered completion**: the consumer sees every buffered item before it
//!   learns how the stream ended
//! - **Orderly teardown**: an active source cancels its producer and waits
//!   for it to stop before discarding anything
//!
//! # Modules
//!
//! - [`channel`] - The closable backpressured channel
//! - [`sink`] / [`source`] - Producer-side and consumer-side contracts
//! - [`producer`] - Push-style producers and the pull-to-push adapter
//! - [`active`] - Runs a producer on its own task behind a `Source`
//! - [`config`] - Configuration types and loading

pub mod active;
pub mod channel;
pub mod config;
pub mod error;
pub mod producer;
pub mod signal;
pub mod sink;
pub mod source;

// Re-export commonly used types
pub use active::{ActiveSource, ActiveSourceBuilder, Executor, RunState};
pub use channel::{ChannelSink, ChannelSource};
pub use config::{ActiveConfig, ChannelConfig, Config, ExecutorKind};
pub use error::{StreamError, TrySendError};
pub use producer::{Producer, SourceProducer};
pub use signal::{Completion, Signal};
pub use sink::Sink;
pub use source::{ItemReader, IterReader, PullSource, Source, SourceExt, iter_source, try_iter_source};
pub use tokio_util::sync::CancellationToken;
