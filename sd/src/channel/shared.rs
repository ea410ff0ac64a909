//! Shared channel core
//!
//! Both faces of a channel point at one `Shared`. The mutex is never held
//! across an await; waiters register with a `Notify` before checking state so
//! no wakeup is lost between the check and the wait.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::state::State;
use crate::error::{StreamError, TrySendError};
use crate::signal::{Completion, Signal};

pub(crate) struct Shared<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    /// Receivers wait here for an item or completion
    item_ready: Notify,
    /// Senders wait here for room, a taken hand-off or a close
    space_ready: Notify,
    cancel: CancellationToken,
    sinks: AtomicUsize,
}

impl<T> Shared<T> {
    pub(crate) fn new(capacity: usize, cancel: CancellationToken) -> Self {
        Self {
            capacity,
            state: Mutex::new(State::new(capacity)),
            item_ready: Notify::new(),
            space_ready: Notify::new(),
            cancel,
            sinks: AtomicUsize::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub(crate) fn is_send_closed(&self) -> bool {
        self.lock().send_closed()
    }

    pub(crate) fn is_receive_closed(&self) -> bool {
        self.lock().receive_closed
    }

    pub(crate) fn completion(&self) -> Option<Completion> {
        self.lock().completion.clone()
    }

    // === Send side ===

    pub(crate) async fn send(&self, item: T) -> Result<(), StreamError> {
        if self.cancel.is_cancelled() {
            return Err(StreamError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StreamError::Cancelled),
            result = self.send_inner(item) => result,
        }
    }

    pub(crate) async fn send_timeout(&self, item: T, timeout: Duration) -> Result<(), StreamError> {
        match tokio::time::timeout(timeout, self.send(item)).await {
            Ok(result) => result,
            Err(_) => Err(StreamError::Timeout(timeout)),
        }
    }

    async fn send_inner(&self, item: T) -> Result<(), StreamError> {
        let ticket = loop {
            let notified = self.space_ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut state = self.lock();
                if state.send_closed() {
                    return Err(StreamError::Closed);
                }
                if state.has_room(self.capacity) {
                    break state.push(item);
                }
            }
            notified.await;
        };
        self.item_ready.notify_waiters();

        if self.capacity > 0 {
            return Ok(());
        }

        // Rendezvous: the send only returns once a receiver took the item
        let mut handoff = Handoff {
            shared: self,
            ticket,
            armed: true,
        };
        loop {
            let notified = self.space_ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let state = self.lock();
                if state.received > ticket {
                    handoff.armed = false;
                    return Ok(());
                }
                if state.receive_closed {
                    handoff.armed = false;
                    return Err(StreamError::Closed);
                }
            }
            notified.await;
        }
    }

    pub(crate) fn try_send(&self, item: T) -> Result<(), TrySendError<T>> {
        {
            let mut state = self.lock();
            if state.send_closed() {
                return Err(TrySendError::Closed(item));
            }
            let room = if self.capacity > 0 {
                state.has_room(self.capacity)
            } else {
                state.buffer.is_empty() && state.receivers_waiting > 0
            };
            if !room {
                return Err(TrySendError::Full(item));
            }
            state.push(item);
        }
        self.item_ready.notify_waiters();
        Ok(())
    }

    /// Record completion; returns false if one was already set
    pub(crate) fn complete_with(&self, completion: Completion) -> bool {
        {
            let mut state = self.lock();
            if let Some(existing) = &state.completion {
                debug!(?existing, ignored = ?completion, "Shared::complete_with: already completed");
                return false;
            }
            debug!(?completion, buffered = state.buffer.len(), "Shared::complete_with: completing");
            state.completion = Some(completion);
        }
        self.item_ready.notify_waiters();
        self.space_ready.notify_waiters();
        true
    }

    pub(crate) fn add_sink(&self) {
        self.sinks.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn release_sink(&self) {
        if self.sinks.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        // Cancellation records no completion; the consumer only sees the close
        if self.cancel.is_cancelled() && !self.is_send_closed() {
            debug!("Shared::release_sink: last sink dropped after cancellation");
            self.close();
            return;
        }
        if self.complete_with(Completion::Failed(StreamError::SinkDropped)) {
            debug!("Shared::release_sink: last sink dropped without completing");
        }
    }

    // === Receive side ===

    pub(crate) async fn receive(&self) -> Result<Signal<T>, StreamError> {
        let mut waiting: Option<WaitingReceiver<'_, T>> = None;
        let outcome = loop {
            let notified = self.item_ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut state = self.lock();
                if let Some(outcome) = state.take() {
                    break outcome;
                }
                if waiting.is_none() {
                    state.receivers_waiting += 1;
                    waiting = Some(WaitingReceiver { shared: self });
                }
            }
            notified.await;
        };
        drop(waiting);
        self.space_ready.notify_waiters();
        outcome
    }

    pub(crate) async fn receive_timeout(&self, timeout: Duration) -> Result<Signal<T>, StreamError> {
        match tokio::time::timeout(timeout, self.receive()).await {
            Ok(result) => result,
            Err(_) => Err(StreamError::Timeout(timeout)),
        }
    }

    pub(crate) fn try_receive(&self) -> Result<Option<Signal<T>>, StreamError> {
        let outcome = self.lock().take();
        match outcome {
            Some(result) => {
                self.space_ready.notify_waiters();
                result.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Close the receive side, discarding buffered items
    pub(crate) fn close(&self) {
        let discarded = {
            let mut state = self.lock();
            if state.receive_closed && state.buffer.is_empty() {
                return;
            }
            state.receive_closed = true;
            std::mem::take(&mut state.buffer)
        };
        self.item_ready.notify_waiters();
        self.space_ready.notify_waiters();
        debug!(discarded = discarded.len(), "Shared::close: receive side closed");
    }
}

/// Counts a receiver parked in `receive`, so a rendezvous `try_send` knows
/// someone is there to take its item
struct WaitingReceiver<'a, T> {
    shared: &'a Shared<T>,
}

impl<T> Drop for WaitingReceiver<'_, T> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.receivers_waiting = state.receivers_waiting.saturating_sub(1);
    }
}

/// A rendezvous item waiting to be taken
///
/// If the send is abandoned (timeout or cancellation) before a receiver took
/// the item, the item is retracted so the send has no effect.
struct Handoff<'a, T> {
    shared: &'a Shared<T>,
    ticket: u64,
    armed: bool,
}

impl<T> Drop for Handoff<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let retracted = {
            let mut state = self.shared.lock();
            if state.received <= self.ticket && !state.receive_closed {
                let item = state.buffer.pop_back();
                if item.is_some() {
                    state.sent -= 1;
                }
                item
            } else {
                None
            }
        };
        if retracted.is_some() {
            debug!(ticket = self.ticket, "Handoff::drop: retracted untaken item");
        }
    }
}
