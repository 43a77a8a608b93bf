// tests/conflict_guard.rs

mod common;
use crate::common::init_tracing;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use depsched::guard::{ConflictGuard, GuardSettings};

fn settings() -> GuardSettings {
    GuardSettings {
        poll_interval: Duration::from_millis(100),
        conflict_threshold: 5,
        cleanup_interval: Duration::ZERO,
    }
}

#[tokio::test]
async fn acquire_and_release_round_trip() {
    let guard = ConflictGuard::new(settings());

    assert!(guard.acquire("k", Duration::from_millis(50)).await);
    assert!(guard.is_held("k"));

    guard.release("k");
    assert!(!guard.is_held("k"));
    assert!(guard.acquire("k", Duration::from_millis(50)).await);
    assert_eq!(guard.conflict_count(), 0);
}

#[tokio::test]
async fn acquire_on_held_key_times_out_and_counts_a_conflict() {
    init_tracing();
    let guard = ConflictGuard::new(settings());
    assert!(guard.try_acquire("k"));

    let started = Instant::now();
    let acquired = guard.acquire("k", Duration::from_secs(1)).await;
    let elapsed = started.elapsed();

    assert!(!acquired);
    assert!(elapsed >= Duration::from_secs(1), "returned early: {elapsed:?}");
    assert!(
        elapsed < Duration::from_millis(1500),
        "overshot the timeout: {elapsed:?}"
    );
    assert_eq!(guard.conflict_count(), 1);
    assert!(guard.is_held("k"), "the original holder keeps the lock");
}

#[tokio::test]
async fn distinct_keys_do_not_block_each_other() {
    let guard = ConflictGuard::new(settings());
    assert!(guard.try_acquire("a"));

    let started = Instant::now();
    assert!(guard.acquire("b", Duration::from_secs(1)).await);

    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(guard.conflict_count(), 0);
}

#[tokio::test]
async fn waiter_gets_the_lock_once_it_is_released() {
    let guard = Arc::new(ConflictGuard::new(GuardSettings {
        poll_interval: Duration::from_millis(10),
        ..settings()
    }));
    assert!(guard.try_acquire("k"));

    let releaser = {
        let guard = Arc::clone(&guard);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            guard.release("k");
        })
    };

    assert!(guard.acquire("k", Duration::from_secs(2)).await);
    releaser.await.unwrap();
    assert_eq!(guard.conflict_count(), 0);
}

#[tokio::test]
async fn concurrent_acquires_of_one_key_are_exclusive() {
    let guard = Arc::new(ConflictGuard::new(GuardSettings {
        poll_interval: Duration::from_millis(5),
        ..settings()
    }));
    let inside = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let guard = Arc::clone(&guard);
        let inside = Arc::clone(&inside);
        let peak = Arc::clone(&peak);
        handles.push(tokio::spawn(async move {
            let lease = guard
                .acquire_lease("shared", Duration::from_secs(5))
                .await
                .expect("lock within timeout");
            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            inside.fetch_sub(1, Ordering::SeqCst);
            drop(lease);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert!(!guard.is_held("shared"));
}

#[tokio::test]
async fn fallback_flips_only_after_threshold_is_exceeded() {
    let guard = ConflictGuard::new(GuardSettings {
        poll_interval: Duration::from_millis(5),
        conflict_threshold: 2,
        cleanup_interval: Duration::ZERO,
    });
    assert!(guard.try_acquire("k"));

    for _ in 0..2 {
        assert!(!guard.acquire("k", Duration::from_millis(20)).await);
    }
    assert_eq!(guard.conflict_count(), 2);
    assert!(!guard.fallback_triggered());

    assert!(!guard.acquire("k", Duration::from_millis(20)).await);
    assert_eq!(guard.conflict_count(), 3);
    assert!(guard.fallback_triggered());
}

#[tokio::test]
async fn reset_clears_run_state_but_keeps_locks() {
    let guard = ConflictGuard::new(GuardSettings {
        poll_interval: Duration::from_millis(5),
        conflict_threshold: 1,
        cleanup_interval: Duration::ZERO,
    });
    assert!(guard.try_acquire("k"));
    for _ in 0..2 {
        assert!(!guard.acquire("k", Duration::from_millis(20)).await);
    }
    assert!(guard.fallback_triggered());

    guard.reset_run_state();

    assert_eq!(guard.conflict_count(), 0);
    assert!(!guard.fallback_triggered());
    assert!(guard.is_held("k"));
}

#[test]
fn releasing_an_unheld_key_is_a_no_op() {
    let guard = ConflictGuard::new(settings());

    guard.release("never-seen");
    assert!(guard.try_acquire("k"));
    guard.release("k");
    guard.release("k");

    assert!(!guard.is_held("k"));
    assert!(guard.try_acquire("k"));
}

#[tokio::test]
async fn dropping_a_lease_releases_the_key() {
    let guard = Arc::new(ConflictGuard::new(settings()));

    let lease = guard
        .acquire_lease("k", Duration::from_millis(50))
        .await
        .expect("free key");
    assert_eq!(lease.key(), "k");
    assert!(guard.is_held("k"));

    drop(lease);
    assert!(!guard.is_held("k"));
}

#[tokio::test]
async fn sweep_never_removes_held_records() {
    let guard = ConflictGuard::new(settings());
    assert!(guard.try_acquire("held"));
    assert!(guard.try_acquire("idle"));
    guard.release("idle");

    tokio::time::sleep(Duration::from_millis(20)).await;
    let removed = guard.sweep_idle_now(Duration::from_millis(5));

    assert_eq!(removed, 1);
    let stats = guard.stats();
    assert_eq!(stats.tracked_keys, 1);
    assert_eq!(stats.active_locks, 1);
    assert!(guard.is_held("held"));
}

#[tokio::test]
async fn sweep_keeps_recently_touched_records() {
    let guard = ConflictGuard::new(settings());
    assert!(guard.try_acquire("k"));
    guard.release("k");

    assert_eq!(guard.sweep_idle_now(Duration::from_secs(60)), 0);
    assert_eq!(guard.stats().tracked_keys, 1);
}

#[tokio::test]
async fn periodic_sweep_honours_interval_and_can_be_disabled() {
    let disabled = ConflictGuard::new(settings());
    assert!(disabled.try_acquire("k"));
    disabled.release("k");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(disabled.sweep_idle(Duration::ZERO), 0, "interval 0 disables sweeping");
    assert_eq!(disabled.stats().tracked_keys, 1);

    let guard = ConflictGuard::new(GuardSettings {
        cleanup_interval: Duration::from_millis(50),
        ..settings()
    });
    assert!(guard.try_acquire("k"));
    guard.release("k");

    assert_eq!(guard.sweep_idle(Duration::ZERO), 0, "interval not yet elapsed");

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(guard.sweep_idle(Duration::ZERO), 1);

    // The sweep just ran, so an immediate second one is skipped.
    assert!(guard.try_acquire("k2"));
    guard.release("k2");
    assert_eq!(guard.sweep_idle(Duration::ZERO), 0);
}

#[test]
fn stats_reflect_table_state() {
    let guard = ConflictGuard::default();
    assert!(guard.try_acquire("a"));
    assert!(guard.try_acquire("b"));
    guard.release("b");
    assert!(!guard.try_acquire("a"));

    let stats = guard.stats();
    assert_eq!(stats.tracked_keys, 2);
    assert_eq!(stats.active_locks, 1);
    assert_eq!(stats.conflict_count, 0, "try_acquire does not count conflicts");
    assert!(!stats.fallback_triggered);
}
