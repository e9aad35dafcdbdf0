//! Concurrent event logging tests
//!
//! Provider calls run on scoped threads and all report into one sink, so the
//! DuckDB-backed log must accept writes from many threads at once.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::TempDir;
use uuid::Uuid;

use seedscan_core::ports::{EventSink, LogEvent};
use seedscan_core::services::{EntryPoint, LoggingService};
use seedscan_core::{Asset, ProviderKind};

/// Number of concurrent writers, about one per (provider, asset) pair of a scan
const THREAD_COUNT: usize = 8;

/// Number of events per thread
const ITERATIONS_PER_THREAD: usize = 10;

#[test]
fn test_concurrent_sink_writes() {
    let temp_dir = TempDir::new().unwrap();
    let service = Arc::new(LoggingService::new(temp_dir.path(), EntryPoint::Cli, "test").unwrap());
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let run_id = Uuid::new_v4();

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|i| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..ITERATIONS_PER_THREAD {
                    let asset = Asset::ALL[i % Asset::ALL.len()];
                    service.record(
                        LogEvent::provider_call_finished(ProviderKind::BlockCypher, asset)
                            .with_run(run_id)
                            .with_phrase_index(i),
                    );
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer thread panicked");
    }

    assert_eq!(service.count().unwrap(), (THREAD_COUNT * ITERATIONS_PER_THREAD) as u64);

    // Ids are unique even when written in the same millisecond
    let entries = service.get_run(run_id, 1_000).unwrap();
    let mut ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), THREAD_COUNT * ITERATIONS_PER_THREAD);
}

#[test]
fn test_two_services_share_one_database_sequentially() {
    let temp_dir = TempDir::new().unwrap();

    {
        let first = LoggingService::new(temp_dir.path(), EntryPoint::Cli, "test").unwrap();
        first.log_command("check").unwrap();
    }
    {
        let second = LoggingService::new(temp_dir.path(), EntryPoint::Library, "test").unwrap();
        second.log_command("verify").unwrap();
        let entries = second.get_recent(10).unwrap();
        assert_eq!(entries.len(), 2);
        let commands: Vec<_> = entries.iter().filter_map(|e| e.command.clone()).collect();
        assert!(commands.contains(&"check".to_string()));
        assert!(commands.contains(&"verify".to_string()));
    }
}
