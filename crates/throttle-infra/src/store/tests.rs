//! Throttle behaviour end to end against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use throttle_core::{Identifier, Limit, RateLimiter, ThrottleError};

use super::{InMemoryCounterStore, MemoryStoreConfig, parse_enabled};

fn store() -> Arc<InMemoryCounterStore> {
    Arc::new(InMemoryCounterStore::new())
}

fn limiter(
    store: &Arc<InMemoryCounterStore>,
    id: &str,
    max: u64,
    window_secs: u64,
) -> RateLimiter {
    RateLimiter::new(
        store.clone(),
        id,
        Limit::new(max, Duration::from_secs(window_secs)),
    )
}

#[test]
fn test_parse_enabled() {
    assert!(parse_enabled(None));
    assert!(parse_enabled(Some("true")));
    assert!(parse_enabled(Some("1")));
    assert!(!parse_enabled(Some("false")));
    assert!(!parse_enabled(Some("FALSE ")));
    assert!(!parse_enabled(Some("0")));
}

#[tokio::test(start_paused = true)]
async fn test_ip_scenario() {
    let store = store();
    let throttle = limiter(&store, "ip:1.2.3.4", 3, 10);
    let key = throttle.storage_key().unwrap().as_str().to_string();

    for _ in 0..3 {
        throttle.check_and_increment().await.unwrap();
    }
    assert!(throttle.check_and_increment().await.unwrap_err().is_limit_exceeded());

    tokio::time::advance(Duration::from_secs(10)).await;

    throttle.check_and_increment().await.unwrap();
    assert_eq!(store.get(&key).await, Some(1));
}

#[tokio::test]
async fn test_twenty_per_window() {
    let store = store();
    let throttle = limiter(&store, "feed:203.0.113.5", 20, 600);

    for call in 1..=20 {
        assert!(throttle.check_and_increment().await.is_ok(), "call {call}");
    }

    match throttle.check_and_increment().await {
        Err(ThrottleError::LimitExceeded { identifier }) => {
            assert_eq!(identifier, "feed:203.0.113.5");
        }
        other => panic!("expected LimitExceeded, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_window_does_not_slide_on_increment() {
    let store = store();
    let throttle = limiter(&store, "login:alice", 2, 10);

    throttle.check_and_increment().await.unwrap();
    tokio::time::advance(Duration::from_secs(6)).await;
    throttle.check_and_increment().await.unwrap();
    assert!(throttle.check_and_increment().await.is_err());

    // Expiry is fixed at the first call, not pushed back by later ones
    tokio::time::advance(Duration::from_secs(4)).await;
    throttle.check_and_increment().await.unwrap();
}

#[tokio::test]
async fn test_clear_after_partial_window() {
    let store = store();
    let throttle = limiter(&store, "cc:1.2.3.4", 3, 600);
    let key = throttle.storage_key().unwrap().as_str().to_string();

    throttle.check_and_increment().await.unwrap();
    throttle.check_and_increment().await.unwrap();
    assert!(throttle.clear().await.unwrap());

    throttle.check_and_increment().await.unwrap();
    assert_eq!(store.get(&key).await, Some(1));
}

#[tokio::test]
async fn test_clear_without_counter() {
    let store = store();
    assert!(limiter(&store, "cc:never-seen", 3, 60).clear().await.unwrap());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_blank_identifier_leaves_store_untouched() {
    let store = store();
    let throttle = limiter(&store, "", 0, 60);

    for _ in 0..10 {
        throttle.check_and_increment().await.unwrap();
    }
    assert!(!throttle.clear().await.unwrap());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_disabled_store_never_rejects() {
    let store = Arc::new(InMemoryCounterStore::with_config(MemoryStoreConfig {
        enabled: false,
        ..Default::default()
    }));
    let throttle = RateLimiter::new(store.clone(), "ip:1.2.3.4", Limit::per_minute(1));

    for _ in 0..50 {
        throttle.check_and_increment().await.unwrap();
    }
    assert!(!throttle.clear().await.unwrap());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_separate_identifiers_separate_windows() {
    let store = store();
    let a = limiter(&store, "ip:1.2.3.4", 1, 60);
    let b = limiter(&store, "ip:1.2.3.5", 1, 60);

    a.check_and_increment().await.unwrap();
    b.check_and_increment().await.unwrap();
    assert!(a.check_and_increment().await.is_err());
    assert!(b.check_and_increment().await.is_err());

    a.clear().await.unwrap();
    a.check_and_increment().await.unwrap();
    assert!(b.check_and_increment().await.is_err());
}

#[tokio::test]
async fn test_run_forgives_successful_payment() {
    let store = store();
    let mut declined = 0;

    // Two declined cards use up the window; a valid one clears it.
    for valid in [false, true, false, false] {
        let outcome = limiter(&store, "cc:198.51.100.7", 2, 600)
            .run(|throttle| async move {
                if valid {
                    throttle.clear().await.unwrap();
                }
                valid
            })
            .await
            .unwrap();
        if !outcome {
            declined += 1;
        }
    }
    assert_eq!(declined, 3);

    let err = limiter(&store, "cc:198.51.100.7", 2, 600)
        .run(|_| async { true })
        .await
        .unwrap_err();
    assert!(err.is_limit_exceeded());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_shares_one_window() {
    let store = store();

    let mut handles = Vec::new();
    for _ in 0..50 {
        let throttle = limiter(&store, "burst:10.0.0.1", 20, 600);
        handles.push(tokio::spawn(async move { throttle.check_and_increment().await }));
    }

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 20);

    let key = Identifier::new("burst:10.0.0.1").storage_key().unwrap();
    assert_eq!(store.get(key.as_str()).await, Some(50));
}

#[tokio::test(start_paused = true)]
async fn test_window_longer_than_clock_range() {
    let store = store();
    let throttle = RateLimiter::new(
        store.clone(),
        "ip:9.9.9.9",
        Limit::new(3, Duration::from_secs(u64::MAX)),
    );

    for _ in 0..3 {
        throttle.check_and_increment().await.unwrap();
    }
    assert!(throttle.check_and_increment().await.unwrap_err().is_limit_exceeded());

    // Such a window never lapses on its own, only an explicit clear resets it
    tokio::time::advance(Duration::from_secs(10 * 365 * 24 * 3600)).await;
    assert!(throttle.check_and_increment().await.is_err());

    assert!(throttle.clear().await.unwrap());
    throttle.check_and_increment().await.unwrap();
}
