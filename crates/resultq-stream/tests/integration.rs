//! Integration tests for resultq-stream.

use chrono::{TimeZone, Utc};
use futures::SinkExt;
use resultq::{Outcome, ResultQueue};
use resultq_stream::{
    download, download_with_queue, AvailableRange, DownloadEvent, QueueConfig, QueueError,
    ResultStream, StreamExt,
};
use std::sync::Arc;
use std::time::Duration;

type Events = DownloadEvent<u64, String>;

#[tokio::test]
async fn test_basic_download() {
    let (sink, mut rx) = download::<u64, String>(QueueConfig::default());

    sink.apply(Events::Begin {
        download_id: "d-1".to_string(),
        available: None,
    });
    sink.apply(Events::Item(1));
    sink.apply(Events::Item(2));
    sink.apply(Events::Item(3));
    sink.apply(Events::End);

    assert_eq!(sink.download_id(), Some("d-1"));
    assert_eq!(sink.available(), None);

    let mut received = Vec::new();
    while let Some(item) = rx.next().await {
        received.push(item.expect("no error expected"));
    }

    assert_eq!(received, vec![1, 2, 3]);
    assert!(rx.is_finished());
}

#[tokio::test]
async fn test_error_ends_stream_after_drain() {
    let (sink, mut rx) = download::<u64, String>(QueueConfig::default());
    sink.push(10);
    sink.error("session lost".to_string());

    assert_eq!(rx.next().await, Some(Ok(10)));
    assert_eq!(
        rx.next().await,
        Some(Err(QueueError::Upstream("session lost".to_string())))
    );
    assert_eq!(rx.next().await, None);

    // The queue itself keeps reporting the failure.
    let queue = Arc::clone(rx.queue());
    assert_eq!(
        queue.next().unwrap().await,
        Err(QueueError::Upstream("session lost".to_string()))
    );
}

#[tokio::test]
async fn test_producer_on_other_thread() {
    let (sink, rx) = download::<u64, String>(QueueConfig::small());

    let producer = std::thread::spawn(move || {
        for i in 0..1_000 {
            sink.push(i);
        }
        sink.end();
    });

    let received: Vec<u64> = rx.map(|item| item.unwrap()).collect().await;
    producer.join().unwrap();

    assert_eq!(received, (0..1_000).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_waits_for_late_items() {
    let (sink, mut rx) = download::<u64, String>(QueueConfig::default());

    let producer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        sink.push(5);
        tokio::time::sleep(Duration::from_millis(20)).await;
        sink.end();
    });

    assert_eq!(rx.next().await, Some(Ok(5)));
    assert_eq!(rx.next().await, None);
    producer.await.unwrap();
}

#[tokio::test]
async fn test_sink_trait() {
    let (mut sink, mut rx) = download::<u64, String>(QueueConfig::default());

    sink.send(Events::Item(42)).await.unwrap();
    sink.feed(Events::Item(43)).await.unwrap();
    sink.flush().await.unwrap();
    SinkExt::close(&mut sink).await.unwrap();

    assert!(sink.is_terminated());
    assert_eq!(rx.next().await, Some(Ok(42)));
    assert_eq!(rx.next().await, Some(Ok(43)));
    assert_eq!(rx.next().await, None);
}

#[tokio::test]
async fn test_events_after_end_are_dropped() {
    let (sink, mut rx) = download::<u64, String>(QueueConfig::default());
    sink.apply(Events::Item(1));
    sink.apply(Events::End);
    sink.apply(Events::Item(2));
    sink.apply(Events::Error("late".to_string()));

    assert_eq!(rx.next().await, Some(Ok(1)));
    assert_eq!(rx.next().await, None);
}

#[tokio::test]
async fn test_dropping_stream_closes_queue() {
    let (sink, rx) = download::<u64, String>(QueueConfig::default());
    sink.push(1);
    sink.push(2);

    drop(rx);

    assert!(sink.is_terminated());
    assert!(sink.queue().is_closed());
    assert_eq!(sink.queue().len(), 0);

    // Producer keeps going without noticing.
    sink.push(3);
    assert_eq!(sink.queue().len(), 0);
}

#[tokio::test]
async fn test_cancel_from_producer_side() {
    let (sink, mut rx) = download::<u64, String>(QueueConfig::default());
    sink.push(1);
    sink.cancel();

    assert_eq!(rx.next().await, None);
    assert_eq!(sink.queue().stats().discarded_on_close, 1);
}

#[tokio::test]
async fn test_cancel_wakes_waiting_stream() {
    let (sink, mut rx) = download::<u64, String>(QueueConfig::default());

    let consumer = tokio::spawn(async move { rx.next().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    sink.cancel();

    assert_eq!(consumer.await.unwrap(), None);
}

#[tokio::test]
async fn test_stream_timeout_does_not_lose_items() {
    let (sink, mut rx) = download::<u64, String>(QueueConfig::default());

    let waited = tokio::time::timeout(Duration::from_millis(10), rx.next()).await;
    assert!(waited.is_err());

    sink.push(7);
    sink.end();
    assert_eq!(rx.next().await, Some(Ok(7)));
    assert_eq!(rx.next().await, None);
}

#[tokio::test]
async fn test_second_consumer_is_rejected() {
    let queue = Arc::new(ResultQueue::<u64, String>::new());
    let (sink, mut rx) = download_with_queue(Arc::clone(&queue));

    let waiting = queue.next().unwrap();
    assert_eq!(rx.next().await, Some(Err(QueueError::WaiterOutstanding)));
    assert!(!rx.is_finished());

    sink.push(1);
    assert_eq!(waiting.await, Ok(Some(1)));
}

#[tokio::test]
async fn test_second_begin_keeps_first_id() {
    let (sink, _rx) = download::<u64, String>(QueueConfig::default());
    let clone = sink.clone();
    sink.begin("first".to_string(), None);
    clone.begin("second".to_string(), None);
    assert_eq!(sink.download_id(), Some("first"));
    assert_eq!(clone.download_id(), Some("first"));
}

#[tokio::test]
async fn test_begin_records_available_range() {
    let (sink, _rx) = download::<u64, String>(QueueConfig::default());
    let clone = sink.clone();
    let range = AvailableRange::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap(),
    );

    sink.apply(Events::Begin {
        download_id: "bars-7".to_string(),
        available: Some(range),
    });
    assert_eq!(clone.download_id(), Some("bars-7"));
    assert_eq!(clone.available(), Some(range));

    // A later begin replaces neither the id nor the range.
    clone.begin("bars-8".to_string(), None);
    assert_eq!(sink.download_id(), Some("bars-7"));
    assert_eq!(sink.available(), Some(range));

    assert!(range.contains(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()));
    assert!(range.contains(range.to));
    assert!(!range.contains(Utc.with_ymd_and_hms(2024, 3, 1, 17, 0, 0).unwrap()));
}

#[test]
fn test_event_from_outcome() {
    assert_eq!(Events::from(Outcome::Item(1)), Events::Item(1));
    assert_eq!(Events::from(Outcome::End), Events::End);
    assert_eq!(
        Events::from(Outcome::Error("x".to_string())),
        Events::Error("x".to_string())
    );
}

#[tokio::test]
async fn test_closed_stream_yields_nothing() {
    let queue = Arc::new(ResultQueue::<u64, String>::new());
    queue.push(1);
    let mut rx = ResultStream::new(Arc::clone(&queue));
    rx.close();

    assert_eq!(rx.next().await, None);
    assert!(queue.is_closed());
}
