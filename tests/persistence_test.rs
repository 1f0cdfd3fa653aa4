//! Snapshot, sweeper and concurrency tests against a shared store.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::json;

use noticeboard::clock::ManualClock;
use noticeboard::model::*;
use noticeboard::snapshot::Snapshot;
use noticeboard::store::{NoticeStore, StoreConfig};
use noticeboard::sweeper::{Sweeper, SweeperConfig};

fn t0() -> DateTime<Utc> {
    "2024-06-01T00:00:00Z".parse().unwrap()
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("noticeboard-{}-{name}.json", std::process::id()))
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

#[test]
fn snapshot_survives_save_and_restore() {
    let clock = Arc::new(ManualClock::new(t0()));
    let store = NoticeStore::with_clock(StoreConfig::default(), clock.clone());
    store.warn("disk full").unwrap();
    clock.advance(TimeDelta::milliseconds(1500));
    store
        .record(
            NoticeType::Custom,
            "example.com/backup",
            NoticeOptions::new()
                .repeat_after(Duration::from_millis(2500))
                .data(json!({"status": "failed"})),
        )
        .unwrap();

    let path = temp_path("roundtrip");
    let saved = store.snapshot().unwrap();
    saved.save(&path).unwrap();

    let restored = NoticeStore::with_clock(StoreConfig::default(), clock);
    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(restored.restore(loaded).unwrap(), 2);
    assert_eq!(restored.snapshot().unwrap(), saved);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn restore_rejects_invalid_records() {
    let clock = Arc::new(ManualClock::new(t0()));
    let store = NoticeStore::with_clock(StoreConfig::default(), clock);
    store.warn("keep me").unwrap();

    let mut snapshot = store.snapshot().unwrap();
    let mut broken = snapshot.notices[0].clone();
    broken.key = "other".to_string();
    broken.occurrences = 0;
    snapshot.notices.push(broken);

    assert!(store.restore(snapshot).is_err());
    // The failed restore leaves the existing notices alone.
    assert_eq!(store.warnings(WarningSelection::All).unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Sweeper
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweeper_runs_until_shutdown_and_checkpoints() {
    let clock = Arc::new(ManualClock::new(t0()));
    let store = Arc::new(NoticeStore::with_clock(StoreConfig::default(), clock.clone()));
    store
        .record(
            NoticeType::Custom,
            "short",
            NoticeOptions::new().expire_after(Duration::from_secs(1)),
        )
        .unwrap();
    store
        .record(NoticeType::Custom, "long", NoticeOptions::new())
        .unwrap();
    clock.advance(TimeDelta::seconds(2));

    let path = temp_path("sweeper");
    let _ = std::fs::remove_file(&path);
    let sweeper = Sweeper::new(
        store.clone(),
        SweeperConfig {
            interval: Duration::from_millis(10),
            checkpoint: Some(path.clone()),
        },
    );

    let handle = tokio::spawn({
        let sweeper = sweeper.clone();
        async move { sweeper.run().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    sweeper.shutdown();
    handle.await.unwrap().unwrap();

    assert_eq!(store.read().unwrap().len(), 1);
    let saved = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(saved.notices.len(), 1);
    assert_eq!(saved.notices[0].key, "long");

    let _ = std::fs::remove_file(&path);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_records_are_all_counted() {
    let store = Arc::new(NoticeStore::new(StoreConfig::default()));
    let threads: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    store
                        .record(NoticeType::Custom, "shared", NoticeOptions::new())
                        .unwrap();
                    store
                        .record(NoticeType::Custom, format!("own-{i}"), NoticeOptions::new())
                        .unwrap();
                    store.notices(&NoticeFilter::new()).unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let st = store.read().unwrap();
    assert_eq!(st.len(), 9);
    let shared = st
        .notice(&NoticeIdentity::new(&NoticeType::Custom, "shared"))
        .unwrap();
    assert_eq!(shared.occurrences, 400);
    assert!(shared.validate().is_ok());
}

#[test]
fn sweeps_interleave_with_records_and_queries() {
    let clock = Arc::new(ManualClock::new(t0()));
    let store = Arc::new(NoticeStore::with_clock(StoreConfig::default(), clock.clone()));
    let brief = || NoticeOptions::new().expire_after(Duration::from_secs(1));
    let hourly = || NoticeOptions::new().expire_after(Duration::from_secs(3600));

    for i in 0..100 {
        store
            .record(NoticeType::Custom, format!("stale-{i}"), brief())
            .unwrap();
    }
    clock.advance(TimeDelta::seconds(2));

    // The sweeper removes the stale notices while writers revive some of them
    // and record their own. The clock creeps forward, but by less than the
    // brief expiry, so everything recorded from here on stays live.
    let sweeper = Sweeper::new(store.clone(), SweeperConfig::default());
    let sweeping = {
        let clock = clock.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                sweeper.sweep_once().unwrap();
                clock.advance(TimeDelta::milliseconds(1));
            }
        })
    };

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let store = store.clone();
            thread::spawn(move || {
                for j in 0..100 {
                    let own = store
                        .record(NoticeType::Custom, format!("live-{w}-{}", j % 5), hourly())
                        .unwrap();
                    let revived = store
                        .record(NoticeType::Custom, format!("stale-{j}"), brief())
                        .unwrap();

                    for recorded in [own, revived] {
                        let found = store
                            .notices(&NoticeFilter::new().identity(recorded.identity.clone()))
                            .unwrap();
                        assert_eq!(found.len(), 1, "{} missing", recorded.identity);
                    }
                    for n in store.snapshot().unwrap().notices {
                        assert!(n.validate().is_ok(), "{:?}", n.validate());
                    }
                }
            })
        })
        .collect();

    sweeping.join().unwrap();
    for t in writers {
        t.join().unwrap();
    }

    assert_eq!(store.expire().unwrap(), 0);
    let st = store.read().unwrap();
    // 4 writers x 5 own keys, plus every stale key revived after the clock moved.
    assert_eq!(st.len(), 120);
    assert!(st.snapshot().notices.iter().all(|n| n.validate().is_ok()));
}
