use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::FixedOffset;
use ulid::Ulid;

use slotbook::clock::{SystemClock, now_ms};
use slotbook::engine::{BookingRequest, Engine, EngineError};
use slotbook::model::{HOUR_MS, Ms, Span};
use slotbook::notify::NotifyHub;
use slotbook::store::{FileStore, MemoryStore, SnapshotStore};

const HOUR: Ms = HOUR_MS;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies.last().unwrap().as_secs_f64() * 1000.0,
    );
}

fn bench_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("slotbook_bench_{}", Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn open_engine(store: Arc<dyn SnapshotStore>) -> Arc<Engine> {
    Arc::new(
        Engine::open(
            store,
            Arc::new(SystemClock),
            FixedOffset::east_opt(0).unwrap(),
            Arc::new(NotifyHub::new()),
        )
        .unwrap(),
    )
}

/// First whole hour at least one hour from now.
fn base_time() -> Ms {
    (now_ms() / HOUR + 2) * HOUR
}

fn request(resource: &str, start: Ms, hours: Ms) -> BookingRequest {
    BookingRequest {
        resource_id: resource.to_string(),
        start,
        end: start + hours * HOUR,
        booker_id: "bench".to_string(),
    }
}

async fn phase1_sequential(store: Arc<dyn SnapshotStore>, n: usize) {
    let engine = open_engine(store);
    let base = base_time();
    let mut latencies = Vec::with_capacity(n);
    let start = Instant::now();

    for i in 0..n {
        let t = Instant::now();
        engine
            .create_booking(request("PC-1", base + i as Ms * HOUR, 1))
            .await
            .unwrap();
        latencies.push(t.elapsed());
    }

    let elapsed = start.elapsed();
    let ops = n as f64 / elapsed.as_secs_f64();
    println!("  {n} bookings in {:.2}s = {ops:.0} ops/sec", elapsed.as_secs_f64());
    print_latency("create latency", &mut latencies);
}

async fn phase2_contended(store: Arc<dyn SnapshotStore>) {
    let engine = open_engine(store);
    let base = base_time();
    let n_tasks = 10;
    let n_per_task = 100;

    // Every task aims at the same hours on the same resource: exactly one
    // create per hour may win.
    let start = Instant::now();
    let tasks = (0..n_tasks).map(|_| {
        let engine = engine.clone();
        async move {
            let (mut ok, mut conflicts) = (0usize, 0usize);
            for j in 0..n_per_task {
                match engine.create_booking(request("Laptop-1", base + j as Ms * HOUR, 1)).await {
                    Ok(_) => ok += 1,
                    Err(EngineError::Conflict(_)) => conflicts += 1,
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            (ok, conflicts)
        }
    });
    let results = futures::future::join_all(tasks).await;

    let elapsed = start.elapsed();
    let ok: usize = results.iter().map(|r| r.0).sum();
    let conflicts: usize = results.iter().map(|r| r.1).sum();
    assert_eq!(ok, n_per_task, "each hour booked exactly once");
    println!(
        "  {n_tasks} tasks x {n_per_task} attempts: {ok} created, {conflicts} conflicts in {:.2}s",
        elapsed.as_secs_f64()
    );
}

async fn phase3_split_churn(store: Arc<dyn SnapshotStore>, n: usize) {
    let engine = open_engine(store);
    let base = base_time();
    let mut latencies = Vec::with_capacity(n);

    // Long bookings, each split once in the middle.
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let b = engine
            .create_booking(request("PC-2", base + i as Ms * 4 * HOUR, 3))
            .await
            .unwrap();
        ids.push((b.id, b.start_time));
    }
    for (id, start) in &ids {
        let t = Instant::now();
        engine
            .cancel_slot(id, Span::new(start + HOUR, start + 2 * HOUR))
            .await
            .unwrap();
        latencies.push(t.elapsed());
    }

    println!("  {} bookings after {n} splits", engine.bookings().await.len());
    print_latency("split latency", &mut latencies);
}

async fn phase4_read_under_load(store: Arc<dyn SnapshotStore>) {
    let engine = open_engine(store);
    let base = base_time();
    for i in 0..500 {
        engine
            .create_booking(request("PC-3", base + i as Ms * HOUR, 1))
            .await
            .unwrap();
    }

    let writer = {
        let engine = engine.clone();
        tokio::spawn(async move {
            for i in 0..500 {
                let _ = engine
                    .create_booking(request("PC-4", base + i as Ms * HOUR, 1))
                    .await;
            }
        })
    };

    let mut latencies = Vec::new();
    while !writer.is_finished() {
        let from = base + (latencies.len() as Ms % 480) * HOUR;
        let t = Instant::now();
        let hits = engine.bookings_in(&Span::new(from, from + 10 * HOUR)).await;
        latencies.push(t.elapsed());
        assert!(!hits.is_empty());
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();

    if !latencies.is_empty() {
        print_latency("window query", &mut latencies);
    }
}

#[tokio::main]
async fn main() {
    let n: usize = std::env::var("SLOTBOOK_BENCH_N")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);
    let dir = bench_dir();

    println!("=== slotbook stress benchmark ===");
    println!("file store: {}\n", dir.display());

    println!("[phase 1a] sequential creates, memory store");
    phase1_sequential(Arc::new(MemoryStore::new()), n).await;

    println!("\n[phase 1b] sequential creates, file store");
    phase1_sequential(Arc::new(FileStore::open(dir.join("p1")).unwrap()), n).await;

    println!("\n[phase 2] contended creates");
    phase2_contended(Arc::new(MemoryStore::new())).await;

    println!("\n[phase 3] slot cancellation (split)");
    phase3_split_churn(Arc::new(MemoryStore::new()), n).await;

    println!("\n[phase 4] window queries under write load");
    phase4_read_under_load(Arc::new(MemoryStore::new())).await;

    let _ = std::fs::remove_dir_all(&dir);
    println!("\n=== benchmark complete ===");
}
