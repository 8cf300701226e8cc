//! Simulated trade-capture download using resultq-stream.
//!
//! Run with: `cargo run -p resultq-stream --features demo --bin demo`
//! More detail: `RUST_LOG=debug cargo run -p resultq-stream --features demo --bin demo`

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use resultq::{QueueConfig, QueueError, ResultQueue};
use resultq_stream::{download, AvailableRange, DownloadEvent, DownloadSink, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// What the trade-capture service streams back for one transaction.
#[derive(Debug, Clone, Serialize)]
struct TradeReport {
    id: u64,
    symbol: &'static str,
    side: Side,
    quantity: u32,
    price: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
enum Side {
    Buy,
    Sell,
}

/// Failure reported by the simulated session.
#[derive(Debug, Clone)]
struct SessionError(String);

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

const SYMBOLS: [&str; 4] = ["EURUSD", "GBPUSD", "USDJPY", "XAUUSD"];

fn report(id: u64, rng: &mut impl Rng) -> TradeReport {
    TradeReport {
        id,
        symbol: SYMBOLS[rng.gen_range(0..SYMBOLS.len())],
        side: if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell },
        quantity: rng.gen_range(1..=100) * 1_000,
        price: rng.gen_range(1.0..2.0),
    }
}

/// Plays the protocol thread: emits begin, `count` reports, then end or error.
fn spawn_session(
    sink: DownloadSink<TradeReport, SessionError>,
    count: u64,
    fail_after: Option<u64>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        let to = Utc::now();
        sink.apply(DownloadEvent::Begin {
            download_id: format!("ttr-{}", rng.gen::<u16>()),
            available: Some(AvailableRange::new(to - ChronoDuration::hours(8), to)),
        });

        for id in 0..count {
            if fail_after == Some(id) {
                sink.apply(DownloadEvent::Error(SessionError(
                    "connection reset by peer".to_string(),
                )));
                return;
            }
            sink.apply(DownloadEvent::Item(report(id, &mut rng)));
            if rng.gen_ratio(1, 200) {
                thread::sleep(Duration::from_millis(rng.gen_range(1..5)));
            }
        }
        sink.apply(DownloadEvent::End);
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== resultq Demo ===\n");

    demo_blocking_consumer()?;
    demo_async_stream().await?;
    demo_upstream_error().await?;
    demo_timeout_and_cancel()?;

    println!("\n=== All demos completed successfully! ===");
    Ok(())
}

/// Demo 1: Blocking consumer, producer outruns it and the buffer grows
fn demo_blocking_consumer() -> anyhow::Result<()> {
    println!("--- Demo 1: Blocking Consumer ---");

    let queue = Arc::new(ResultQueue::with_config(QueueConfig::default()));
    let session = spawn_session(DownloadSink::new(Arc::clone(&queue)), 2_500, None);

    // Let the session get ahead so the buffer has to grow.
    thread::sleep(Duration::from_millis(20));

    let mut count = 0u64;
    while let Some(report) = queue.next_timeout(Duration::from_secs(1))? {
        if count < 3 {
            println!("  {}", serde_json::to_string(&report)?);
        }
        anyhow::ensure!(report.id == count, "out of order: got {} expected {}", report.id, count);
        count += 1;
    }
    session.join().map_err(|_| anyhow::anyhow!("session thread panicked"))?;

    let stats = queue.stats();
    println!(
        "  Received {} reports in order (peak buffered {}, grew {} times, {} direct hand-offs)",
        count, stats.peak_buffered, stats.grow_events, stats.fast_path
    );
    println!("  ✓ Blocking consumer complete\n");
    Ok(())
}

/// Demo 2: Async stream consumer
async fn demo_async_stream() -> anyhow::Result<()> {
    println!("--- Demo 2: Async Stream ---");

    let (sink, reports) = download::<TradeReport, SessionError>(QueueConfig::small());
    let session = spawn_session(sink.clone(), 500, None);

    let volume: u64 = reports
        .map(|report| report.map(|r| u64::from(r.quantity)))
        .fold(0u64, |acc, quantity| acc + quantity.unwrap_or(0))
        .await;
    session.join().map_err(|_| anyhow::anyhow!("session thread panicked"))?;

    println!(
        "  Download {} streamed, total volume {}",
        sink.download_id().unwrap_or("?"),
        volume
    );
    println!("  ✓ Async stream complete\n");
    Ok(())
}

/// Demo 3: The session fails mid-download
async fn demo_upstream_error() -> anyhow::Result<()> {
    println!("--- Demo 3: Upstream Error ---");

    let (sink, mut reports) = download::<TradeReport, SessionError>(QueueConfig::default());
    let session = spawn_session(sink, 100, Some(40));

    let mut received = 0;
    while let Some(report) = reports.next().await {
        match report {
            Ok(_) => received += 1,
            Err(QueueError::Upstream(err)) => {
                println!("  Download failed after {} reports: {}", received, err);
            }
            Err(err) => anyhow::bail!("unexpected queue error: {err:?}"),
        }
    }
    session.join().map_err(|_| anyhow::anyhow!("session thread panicked"))?;

    println!("  ✓ Upstream error complete\n");
    Ok(())
}

/// Demo 4: Consumer times out, keeps going, then cancels
fn demo_timeout_and_cancel() -> anyhow::Result<()> {
    println!("--- Demo 4: Timeout and Cancel ---");

    let queue = Arc::new(ResultQueue::<TradeReport, SessionError>::new());
    let sink = DownloadSink::new(Arc::clone(&queue));

    match queue.next_timeout(Duration::from_millis(50)) {
        Err(err) if err.is_timeout() => println!("  Nothing yet: {}", err),
        other => anyhow::bail!("expected a timeout, got {:?}", other.map(|r| r.map(|r| r.id))),
    }

    let mut rng = rand::thread_rng();
    for id in 0..10 {
        sink.push(report(id, &mut rng));
    }

    let first = queue.next_timeout(Duration::from_millis(50))?;
    println!("  After timeout, next report is #{:?}", first.map(|r| r.id));

    sink.cancel();
    println!(
        "  Cancelled with {} reports discarded; next() now returns {:?}",
        queue.stats().discarded_on_close,
        queue.next_timeout(Duration::from_millis(50))?.map(|r| r.id)
    );
    println!("  ✓ Timeout and cancel complete\n");
    Ok(())
}
