//! Closable backpressured channel
//!
//! A channel is a FIFO transfer point between one producer and one consumer:
//!
//! - `capacity > 0`: bounded buffer, `send` waits while full
//! - `capacity == 0`: rendezvous, `send` waits until a receiver takes the item
//!
//! The send side completes with success or an error; the receive side sees
//! every buffered item before it sees that completion. Closing the receive
//! side discards buffered items and fails any further send.

mod handles;
mod shared;
mod state;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use handles::{ChannelSink, ChannelSource};

use crate::config::ChannelConfig;
use shared::Shared;

/// Create a channel with the given capacity (0 for rendezvous)
pub fn channel<T: Send + 'static>(capacity: usize) -> (ChannelSink<T>, ChannelSource<T>) {
    with_cancellation(capacity, CancellationToken::new())
}

/// Create a bounded channel; a capacity of 0 is raised to 1
pub fn bounded<T: Send + 'static>(capacity: usize) -> (ChannelSink<T>, ChannelSource<T>) {
    channel(capacity.max(1))
}

/// Create a zero-capacity channel where each send pairs with a receive
pub fn rendezvous<T: Send + 'static>() -> (ChannelSink<T>, ChannelSource<T>) {
    channel(0)
}

/// Create a channel sized from configuration
pub fn from_config<T: Send + 'static>(config: &ChannelConfig) -> (ChannelSink<T>, ChannelSource<T>) {
    channel(config.capacity)
}

/// Create a channel whose blocked sends fail with `Cancelled` once `cancel` fires
pub fn with_cancellation<T: Send + 'static>(
    capacity: usize,
    cancel: CancellationToken,
) -> (ChannelSink<T>, ChannelSource<T>) {
    debug!(capacity, "channel::with_cancellation: called");
    let shared = Arc::new(Shared::new(capacity, cancel));
    (ChannelSink::new(Arc::clone(&shared)), ChannelSource::new(shared))
}
