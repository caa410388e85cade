//! Tests for LogFilesManager
//!
//! These tests verify:
//! - Routing of appends and loads by relative path
//! - LRU eviction of write handles at capacity, before the new append
//! - Modification counters are only kept for paths in use
//! - Read permits are returned after every scan, failed ones included
//! - Concurrent appends and loads from several threads
//! - Append-during-scan detection through the manager

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use blocklog::{Config, LogError, LogFilesManager, ManagerConfig};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_manager(write_permits: usize, read_permits: usize) -> (TempDir, LogFilesManager) {
    let temp_dir = TempDir::new().unwrap();
    let config = ManagerConfig::builder()
        .directory(temp_dir.path())
        .common(Config::builder().block_size(64).force_flush(false).build())
        .write_permits(write_permits)
        .read_permits(read_permits)
        .pool(1, 8)
        .build();
    let manager = LogFilesManager::new(config).unwrap();
    (temp_dir, manager)
}

fn collect(manager: &LogFilesManager, path: &str) -> Vec<Vec<u8>> {
    let mut records = Vec::new();
    manager
        .load(path, |record: &[u8], _: u64| {
            records.push(record.to_vec());
            true
        })
        .unwrap();
    records
}

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn test_new_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let directory = temp_dir.path().join("nested").join("logs");

    let config = ManagerConfig::builder().directory(&directory).build();
    let _manager = LogFilesManager::new(config).unwrap();

    assert!(directory.is_dir());
}

#[test]
fn test_new_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();

    let config = ManagerConfig::builder()
        .directory(temp_dir.path())
        .write_permits(0)
        .build();
    assert!(matches!(LogFilesManager::new(config), Err(LogError::Config(_))));

    let config = ManagerConfig::builder()
        .directory(temp_dir.path())
        .pool(10, 2)
        .build();
    assert!(matches!(LogFilesManager::new(config), Err(LogError::Config(_))));
}

// =============================================================================
// Routing Tests
// =============================================================================

#[test]
fn test_append_and_load_by_path() {
    let (temp, manager) = setup_temp_manager(4, 4);

    manager.append("a.log", b"a1").unwrap();
    manager.append("b.log", b"b1").unwrap();
    manager.append("a.log", b"a2").unwrap();

    assert_eq!(collect(&manager, "a.log"), vec![b"a1".to_vec(), b"a2".to_vec()]);
    assert_eq!(collect(&manager, "b.log"), vec![b"b1".to_vec()]);
    assert!(temp.path().join("a.log").exists());
    assert!(temp.path().join("b.log").exists());
}

#[test]
fn test_load_unknown_path_is_empty() {
    let (temp, manager) = setup_temp_manager(4, 4);

    assert!(collect(&manager, "never.log").is_empty());
    assert!(!manager.is_open("never.log"));
    assert_eq!(std::fs::metadata(temp.path().join("never.log")).unwrap().len(), 5);
}

#[test]
fn test_large_records_through_manager() {
    let (_temp, manager) = setup_temp_manager(2, 2);
    let record: Vec<u8> = (0..10_000u32).map(|i| (i % 256) as u8).collect();

    manager.append(PathBuf::from("big.log"), &record).unwrap();

    assert_eq!(collect(&manager, "big.log"), vec![record]);
}

// =============================================================================
// Eviction Tests
// =============================================================================

#[test]
fn test_lru_eviction_at_capacity() {
    let (_temp, manager) = setup_temp_manager(2, 2);

    manager.append("a.log", b"a1").unwrap();
    manager.append("b.log", b"b1").unwrap();
    assert_eq!(manager.open_handles(), 2);

    manager.append("c.log", b"c1").unwrap();
    assert_eq!(manager.open_handles(), 2);
    assert!(!manager.is_open("a.log"));
    assert!(manager.is_open("b.log"));
    assert!(manager.is_open("c.log"));

    // The evicted file is reopened and resumed
    manager.append("a.log", b"a2").unwrap();
    assert!(manager.is_open("a.log"));
    assert!(!manager.is_open("b.log"));

    assert_eq!(collect(&manager, "a.log"), vec![b"a1".to_vec(), b"a2".to_vec()]);
    assert_eq!(collect(&manager, "b.log"), vec![b"b1".to_vec()]);
}

#[test]
fn test_append_refreshes_recency() {
    let (_temp, manager) = setup_temp_manager(2, 2);

    manager.append("a.log", b"1").unwrap();
    manager.append("b.log", b"2").unwrap();
    manager.append("a.log", b"3").unwrap();
    manager.append("c.log", b"4").unwrap();

    assert!(manager.is_open("a.log"));
    assert!(!manager.is_open("b.log"));
    assert!(manager.is_open("c.log"));
}

#[test]
fn test_many_files_small_cache() {
    let (_temp, manager) = setup_temp_manager(3, 2);

    for round in 0..5u8 {
        for file in 0..10u8 {
            manager
                .append(format!("file-{}.log", file), &[file, round])
                .unwrap();
        }
    }

    assert_eq!(manager.open_handles(), 3);
    for file in 0..10u8 {
        let expected: Vec<Vec<u8>> = (0..5u8).map(|round| vec![file, round]).collect();
        assert_eq!(collect(&manager, &format!("file-{}.log", file)), expected);
    }
}

#[test]
fn test_close_releases_all_handles() {
    let (_temp, manager) = setup_temp_manager(4, 4);

    manager.append("a.log", b"a").unwrap();
    manager.append("b.log", b"b").unwrap();
    manager.close().unwrap();

    assert_eq!(manager.open_handles(), 0);
    assert_eq!(collect(&manager, "a.log"), vec![b"a".to_vec()]);

    manager.append("a.log", b"again").unwrap();
    assert_eq!(collect(&manager, "a.log"), vec![b"a".to_vec(), b"again".to_vec()]);
}

#[test]
fn test_eviction_happens_before_append() {
    let (temp, manager) = setup_temp_manager(2, 2);
    manager.append("a.log", b"a").unwrap();
    manager.append("b.log", b"b").unwrap();

    // The new handle cannot open, but "a.log" was already closed for it
    let header = [7u8, 0, 0, 0, 64];
    std::fs::write(temp.path().join("c.log"), header).unwrap();
    let result = manager.append("c.log", b"c");

    assert!(matches!(result, Err(LogError::UnsupportedVersion { version: 7 })));
    assert_eq!(manager.open_handles(), 1);
    assert!(!manager.is_open("a.log"));
    assert!(manager.is_open("b.log"));
    assert!(!manager.is_open("c.log"));
    assert_eq!(std::fs::read(temp.path().join("c.log")).unwrap(), header);
    assert_eq!(collect(&manager, "a.log"), vec![b"a".to_vec()]);
}

#[test]
fn test_counters_bounded_by_open_handles() {
    let (_temp, manager) = setup_temp_manager(2, 2);

    for file in 0..50u8 {
        manager.append(format!("file-{}.log", file), &[file]).unwrap();
    }
    assert_eq!(manager.tracked_paths(), 2);

    // Transient read handles give their counter back
    assert_eq!(collect(&manager, "file-0.log"), vec![vec![0u8]]);
    assert_eq!(collect(&manager, "missing.log"), Vec::<Vec<u8>>::new());
    assert_eq!(manager.tracked_paths(), 2);

    manager.close().unwrap();
    assert_eq!(manager.tracked_paths(), 0);
}

// =============================================================================
// Read Permit Tests
// =============================================================================

#[test]
fn test_read_permit_returned_after_load() {
    let (_temp, manager) = setup_temp_manager(2, 3);
    manager.append("a.log", b"a").unwrap();

    let mut permits_during_scan = None;
    manager
        .load("a.log", |_: &[u8], _: u64| {
            permits_during_scan = Some(manager.available_read_permits());
            true
        })
        .unwrap();

    assert_eq!(permits_during_scan, Some(2));
    assert_eq!(manager.available_read_permits(), 3);
}

#[test]
fn test_read_permit_returned_after_failed_load() {
    let (temp, manager) = setup_temp_manager(2, 3);
    std::fs::write(temp.path().join("bad.log"), [7u8, 0, 0, 0, 64]).unwrap();

    let result = manager.load("bad.log", |_: &[u8], _: u64| true);

    assert!(matches!(result, Err(LogError::UnsupportedVersion { version: 7 })));
    assert_eq!(manager.available_read_permits(), 3);
}

#[test]
fn test_concurrent_loads() {
    let (_temp, manager) = setup_temp_manager(4, 2);
    let manager = Arc::new(manager);
    for i in 0..100u32 {
        manager.append("shared.log", &i.to_be_bytes()).unwrap();
    }

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let mut count = 0u32;
                manager
                    .load("shared.log", |record: &[u8], _: u64| {
                        assert_eq!(record, &count.to_be_bytes());
                        count += 1;
                        true
                    })
                    .unwrap();
                count
            })
        })
        .collect();

    for reader in readers {
        assert_eq!(reader.join().unwrap(), 100);
    }
    assert_eq!(manager.available_read_permits(), 2);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_appends_to_many_files() {
    let (_temp, manager) = setup_temp_manager(2, 4);
    let manager = Arc::new(manager);

    let writers: Vec<_> = (0..4u8)
        .map(|writer| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for sequence in 0..25u8 {
                    let path = format!("w{}.log", sequence % 3);
                    manager.append(path, &[writer, sequence]).unwrap();
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }

    let total: usize = (0..3)
        .map(|file| collect(&manager, &format!("w{}.log", file)).len())
        .sum();
    assert_eq!(total, 100);
}

#[test]
fn test_append_during_load_is_detected() {
    let (_temp, manager) = setup_temp_manager(2, 2);
    for i in 0..3u8 {
        manager.append("a.log", &[i; 10]).unwrap();
    }

    let result = manager.load("a.log", |_: &[u8], _: u64| {
        manager.append("a.log", b"interleaved").unwrap();
        true
    });

    assert!(matches!(result, Err(LogError::ConcurrentModification { .. })));
}

#[test]
fn test_append_to_other_path_during_load() {
    let (_temp, manager) = setup_temp_manager(2, 2);
    for i in 0..3u8 {
        manager.append("a.log", &[i; 10]).unwrap();
    }

    let mut seen = 0;
    manager
        .load("a.log", |_: &[u8], _: u64| {
            manager.append("b.log", b"elsewhere").unwrap();
            seen += 1;
            true
        })
        .unwrap();

    assert_eq!(seen, 3);
    assert_eq!(collect(&manager, "b.log").len(), 3);
}
