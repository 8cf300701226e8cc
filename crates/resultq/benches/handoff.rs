use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use resultq::{QueueConfig, ResultQueue};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const MESSAGES: u64 = 100_000;
const WAIT: Duration = Duration::from_secs(10);

/// Producer fills the buffer first, consumer drains afterwards.
fn bench_buffered(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffered");
    group.throughput(Throughput::Elements(MESSAGES));

    for grow_by in [16usize, 1000, 65_536] {
        group.bench_with_input(BenchmarkId::new("grow_by", grow_by), &grow_by, |b, &grow_by| {
            b.iter(|| {
                let queue = ResultQueue::<u64, ()>::with_config(QueueConfig::new(grow_by, grow_by));
                for i in 0..MESSAGES {
                    queue.push(i);
                }
                queue.signal_end();
                while let Ok(Some(item)) = queue.next_timeout(WAIT) {
                    black_box(item);
                }
            });
        });
    }

    group.finish();
}

/// Producer thread and blocking consumer running concurrently.
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");
    group.throughput(Throughput::Elements(MESSAGES));

    group.bench_function("thread_to_blocking_consumer", |b| {
        b.iter(|| {
            let queue = Arc::new(ResultQueue::<u64, ()>::new());

            let producer = {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..MESSAGES {
                        queue.push(i);
                    }
                    queue.signal_end();
                })
            };

            let mut count = 0u64;
            while let Ok(Some(item)) = queue.next_timeout(WAIT) {
                black_box(item);
                count += 1;
            }
            assert_eq!(count, MESSAGES);
            producer.join().unwrap();
        });
    });

    group.bench_function("thread_to_async_consumer", |b| {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        b.iter(|| {
            let queue = Arc::new(ResultQueue::<u64, ()>::new());

            let producer = {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..MESSAGES {
                        queue.push(i);
                    }
                    queue.signal_end();
                })
            };

            runtime.block_on(async {
                while let Ok(Some(item)) = queue.next().unwrap().await {
                    black_box(item);
                }
            });
            producer.join().unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_buffered, bench_concurrent);
criterion_main!(benches);
