//! Channel state protected by the shared mutex

use std::collections::VecDeque;

use crate::error::StreamError;
use crate::signal::{Completion, Signal};

/// Mutable channel state
///
/// `sent`/`received` count items entering and leaving the buffer; a
/// rendezvous sender uses them to learn when its item was taken.
pub(crate) struct State<T> {
    pub(crate) buffer: VecDeque<T>,
    pub(crate) receive_closed: bool,
    pub(crate) completion: Option<Completion>,
    pub(crate) sent: u64,
    pub(crate) received: u64,
    pub(crate) receivers_waiting: usize,
}

impl<T> State<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity.max(1)),
            receive_closed: false,
            completion: None,
            sent: 0,
            received: 0,
            receivers_waiting: 0,
        }
    }

    /// No more sends are accepted once completed or closed by the consumer
    pub(crate) fn send_closed(&self) -> bool {
        self.receive_closed || self.completion.is_some()
    }

    /// Whether a new item fits; rendezvous allows one pending hand-off
    pub(crate) fn has_room(&self, capacity: usize) -> bool {
        if capacity > 0 {
            self.buffer.len() < capacity
        } else {
            self.buffer.is_empty()
        }
    }

    pub(crate) fn push(&mut self, item: T) -> u64 {
        let ticket = self.sent;
        self.buffer.push_back(item);
        self.sent += 1;
        ticket
    }

    /// Take the next receive outcome, or `None` if the caller has to wait
    ///
    /// Completion is only surfaced once the buffer is drained; observing it
    /// closes the receive side.
    pub(crate) fn take(&mut self) -> Option<Result<Signal<T>, StreamError>> {
        if self.receive_closed {
            return Some(Err(StreamError::Closed));
        }
        if let Some(item) = self.buffer.pop_front() {
            self.received += 1;
            return Some(Ok(Signal::Item(item)));
        }
        if let Some(completion) = &self.completion {
            self.receive_closed = true;
            return Some(completion.to_signal());
        }
        None
    }
}
