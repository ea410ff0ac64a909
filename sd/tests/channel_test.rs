//! Integration tests for the streamduct channel
//!
//! These tests exercise a sink and a source on separate tasks.

use std::time::Duration;

use proptest::prelude::*;
use streamduct::channel;
use streamduct::{Signal, StreamError};

/// Drain a channel source, returning the items and the terminal outcome
async fn drain<T: Send + 'static>(rx: &streamduct::ChannelSource<T>) -> (Vec<T>, Result<(), StreamError>) {
    let mut items = Vec::new();
    loop {
        match rx.receive().await {
            Ok(Signal::Item(item)) => items.push(item),
            Ok(Signal::EndOfStream) => return (items, Ok(())),
            Err(e) => return (items, Err(e)),
        }
    }
}

// =============================================================================
// Ordering and completion
// =============================================================================

#[tokio::test]
async fn test_fifo_then_clean_end() {
    let (sink, rx) = channel::bounded::<u32>(4);

    let producer = tokio::spawn(async move {
        for i in 0..100 {
            sink.send(i).await.expect("send should succeed");
        }
        sink.complete();
    });

    let (items, end) = drain(&rx).await;
    producer.await.expect("producer task");

    assert_eq!(items, (0..100).collect::<Vec<_>>());
    assert!(end.is_ok());
    assert!(rx.is_closed());
    assert!(rx.receive().await.unwrap_err().is_closed());
}

#[tokio::test]
async fn test_items_then_cause() {
    let (sink, rx) = channel::bounded::<u32>(2);

    let producer = tokio::spawn(async move {
        for i in 0..5 {
            sink.send(i).await.expect("send should succeed");
        }
        sink.complete_exceptionally(StreamError::message("disk on fire"));
    });

    let (items, end) = drain(&rx).await;
    producer.await.expect("producer task");

    assert_eq!(items, vec![0, 1, 2, 3, 4]);
    let err = end.unwrap_err();
    assert!(err.to_string().contains("disk on fire"));
    assert!(rx.completion_error().is_some());
}

#[tokio::test]
async fn test_close_after_k_discards_rest() {
    let (sink, rx) = channel::bounded::<u32>(8);

    let producer = tokio::spawn(async move {
        let mut sent = 0;
        for i in 0..1_000 {
            if sink.send(i).await.is_err() {
                break;
            }
            sent += 1;
        }
        sent
    });

    for expected in 0..3 {
        assert_eq!(rx.receive().await.unwrap(), Signal::Item(expected));
    }
    rx.close();

    let sent = tokio::time::timeout(Duration::from_secs(5), producer)
        .await
        .expect("producer should stop after close")
        .expect("producer task");

    // At most the three received plus one full buffer
    assert!(sent < 3 + 8 + 1, "sent {}", sent);
    assert!(rx.is_empty());
    assert!(rx.receive().await.unwrap_err().is_closed());
}

#[tokio::test]
async fn test_close_wakes_blocked_sender() {
    let (sink, rx) = channel::bounded::<u32>(1);
    sink.send(1).await.unwrap();

    let blocked = tokio::spawn(async move { sink.send(2).await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    rx.close();

    let result = tokio::time::timeout(Duration::from_secs(5), blocked)
        .await
        .expect("sender should wake")
        .expect("sender task");
    assert!(result.unwrap_err().is_closed());
}

#[tokio::test]
async fn test_completion_wakes_blocked_receiver() {
    let (sink, rx) = channel::bounded::<u32>(1);

    let waiter = tokio::spawn(async move { rx.receive().await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    sink.complete();

    let outcome = waiter.await.expect("receiver task");
    assert_eq!(outcome.unwrap(), Signal::EndOfStream);
}

// =============================================================================
// Timeouts and cancellation
// =============================================================================

#[tokio::test]
async fn test_send_timeout_when_full() {
    let (sink, rx) = channel::bounded::<u32>(1);
    sink.send(1).await.unwrap();

    let err = sink.send_timeout(2, Duration::from_millis(20)).await.unwrap_err();
    assert!(matches!(err, StreamError::Timeout(_)));
    assert!(err.is_retryable());

    assert_eq!(rx.try_receive().unwrap(), Some(Signal::Item(1)));
    assert_eq!(rx.try_receive().unwrap(), None);
}

#[tokio::test]
async fn test_receive_timeout_when_empty() {
    let (_sink, rx) = channel::bounded::<u32>(1);
    let err = rx.receive_timeout(Duration::from_millis(20)).await.unwrap_err();
    assert!(matches!(err, StreamError::Timeout(_)));
    assert!(!rx.is_closed());
}

#[tokio::test]
async fn test_cancellation_wakes_blocked_sender() {
    let cancel = streamduct::CancellationToken::new();
    let (sink, _rx) = channel::with_cancellation::<u32>(1, cancel.clone());
    sink.send(1).await.unwrap();

    let blocked = tokio::spawn(async move { sink.send(2).await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let result = blocked.await.expect("sender task");
    assert!(result.unwrap_err().is_cancelled());
}

// =============================================================================
// Rendezvous
// =============================================================================

#[tokio::test]
async fn test_rendezvous_send_waits_for_receiver() {
    let (sink, rx) = channel::rendezvous::<&str>();

    let sender = tokio::spawn(async move {
        sink.send("hello").await.expect("send should pair");
        sink.complete();
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!sender.is_finished(), "send must wait for a receiver");

    assert_eq!(rx.receive().await.unwrap(), Signal::Item("hello"));
    sender.await.expect("sender task");
    assert_eq!(rx.receive().await.unwrap(), Signal::EndOfStream);
}

#[tokio::test]
async fn test_rendezvous_pairs_every_item() {
    let (sink, rx) = channel::rendezvous::<u32>();

    let sender = tokio::spawn(async move {
        for i in 0..50 {
            sink.send(i).await.expect("send should pair");
            // Nothing is ever buffered beyond the pending hand-off
        }
        sink.complete();
    });

    let (items, end) = drain(&rx).await;
    sender.await.expect("sender task");
    assert_eq!(items, (0..50).collect::<Vec<_>>());
    assert!(end.is_ok());
}

#[tokio::test]
async fn test_rendezvous_timeout_retracts_item() {
    let (sink, rx) = channel::rendezvous::<u32>();

    let err = sink.send_timeout(9, Duration::from_millis(20)).await.unwrap_err();
    assert!(matches!(err, StreamError::Timeout(_)));

    // The timed-out item is not delivered
    assert_eq!(rx.try_receive().unwrap(), None);
    sink.complete();
    assert_eq!(rx.receive().await.unwrap(), Signal::EndOfStream);
}

#[tokio::test]
async fn test_rendezvous_try_send_with_waiting_receiver() {
    let (sink, rx) = channel::rendezvous::<u32>();

    let receiver = tokio::spawn(async move { rx.receive().await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    sink.try_send(5).expect("a receiver is waiting");
    let outcome = receiver.await.expect("receiver task");
    assert_eq!(outcome.unwrap(), Signal::Item(5));
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_fifo_for_any_capacity(items in proptest::collection::vec(any::<u16>(), 0..64), capacity in 0usize..8) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("runtime");

        let expected = items.clone();
        let (received, end) = runtime.block_on(async move {
            let (sink, rx) = channel::channel::<u16>(capacity);
            let producer = tokio::spawn(async move {
                for item in items {
                    sink.send(item).await.expect("send should succeed");
                }
                sink.complete();
            });
            let drained = drain(&rx).await;
            producer.await.expect("producer task");
            drained
        });

        prop_assert_eq!(received, expected);
        prop_assert!(end.is_ok());
    }
}
