use std::sync::Arc;
use std::time::Duration;

use distributed_lock::{
    DistributedLockError, LockConfig, LockHandle, LockService, StrategyKind, UsingOptions,
};
use lock_backend::{BackendAdapter, MemoryBackend};
use parking_lot::Mutex;

fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn nodes(count: usize) -> (Vec<Arc<dyn BackendAdapter>>, Vec<MemoryBackend>) {
    let backends: Vec<MemoryBackend> = (0..count).map(|_| MemoryBackend::new()).collect();
    let adapters = backends.iter().map(|b| Arc::new(b.clone()) as Arc<dyn BackendAdapter>).collect();
    (adapters, backends)
}

async fn service_with(count: usize, config: LockConfig) -> (LockService, Vec<MemoryBackend>) {
    let (adapters, backends) = nodes(count);
    let service = LockService::new(adapters, config).unwrap();
    service.init().await.unwrap();
    (service, backends)
}

async fn service(count: usize) -> (LockService, Vec<MemoryBackend>) {
    service_with(count, LockConfig::default()).await
}

#[tokio::test]
async fn test_acquire_release_reacquire_roundtrip() {
    setup();
    let (service, _backends) = service(1).await;

    let handle = service.acquire("res", None).await.unwrap();
    service.release("res", &handle).await.unwrap();
    let handle = service.acquire("res", None).await.unwrap();
    service.release("res", &handle).await.unwrap();
}

#[tokio::test]
async fn test_values_are_unique_per_acquisition() {
    setup();
    let (service, _backends) = service(1).await;

    let first = service.acquire("res", None).await.unwrap();
    service.release("res", &first).await.unwrap();
    let second = service.acquire("res", None).await.unwrap();

    assert_ne!(first.value, second.value);
}

#[tokio::test]
async fn test_release_with_stale_value_leaves_foreign_lock() {
    setup();
    let (service, backends) = service(1).await;

    backends[0].set_if_absent("res", "foreign-holder", Duration::from_secs(60)).await.unwrap();

    let stale = LockHandle::new("res", "stale-value", Duration::from_secs(30), StrategyKind::Simple);
    service.release("res", &stale).await.unwrap();

    assert_eq!(backends[0].get_value("res").await.unwrap(), Some("foreign-holder".to_string()));
}

#[tokio::test]
async fn test_strategy_selection_follows_node_count() {
    setup();
    for (count, expected) in [(1, "simple"), (2, "simple"), (3, "redlock")] {
        let (service, _backends) = service(count).await;
        let handle = service.acquire("res", None).await.unwrap();
        assert_eq!(handle.metadata.strategy.as_str(), expected, "{} nodes", count);
    }
}

#[tokio::test]
async fn test_acquire_rejects_empty_key() {
    setup();
    let (service, _backends) = service(1).await;

    let err = service.acquire("", None).await.unwrap_err();
    assert_eq!(err.to_string(), "Lock key must be a non-empty string");
}

#[tokio::test]
async fn test_operations_before_init_fail() {
    setup();
    let (adapters, _backends) = nodes(1);
    let service = LockService::new(adapters, LockConfig::default()).unwrap();

    let err = service.acquire("res", None).await.unwrap_err();
    assert_eq!(err.to_string(), "Lock service used before initialization");
}

#[tokio::test]
async fn test_empty_node_set_is_a_configuration_error() {
    setup();
    let err = LockService::new(Vec::new(), LockConfig::default()).unwrap_err();
    assert!(matches!(err, DistributedLockError::Configuration(_)));
}

#[tokio::test]
async fn test_quorum_override_validated_at_construction() {
    setup();
    let (adapters, _backends) = nodes(3);
    let config = LockConfig { quorum: Some(4), ..LockConfig::default() };

    let err = LockService::new(adapters, config).unwrap_err();
    assert_eq!(err.to_string(), "Quorum 4 is invalid for 3 configured backend nodes");
}

#[tokio::test]
async fn test_custom_ttl_handles_are_exact_and_never_cached() {
    setup();
    let (service, _backends) = service(1).await;

    let first = service.acquire("res", Some(Duration::from_millis(45_000))).await.unwrap();
    assert_eq!(first.ttl, Duration::from_millis(45_000));
    assert!(service.retained_handle("res").is_none());
    service.release("res", &first).await.unwrap();

    let second = service.acquire("res", Some(Duration::from_millis(120_000))).await.unwrap();
    assert_eq!(second.ttl, Duration::from_millis(120_000));
    assert!(service.retained_handle("res").is_none());
    service.release("res", &second).await.unwrap();
}

#[tokio::test]
async fn test_default_ttl_acquisitions_populate_retained_cache() {
    setup();
    let (service, _backends) = service(1).await;

    let handle = service.acquire("res", None).await.unwrap();
    let retained = service.retained_handle("res").unwrap();
    assert_eq!(retained.value, handle.value);

    service.release("res", &handle).await.unwrap();
    assert!(service.retained_handle("res").is_none());
}

#[tokio::test]
async fn test_using_runs_section_and_releases() {
    setup();
    let (service, backends) = service(1).await;
    let observer = backends[0].clone();

    let result = service
        .using("res", UsingOptions::default(), |_signal| async move { 7 })
        .await
        .unwrap();

    assert_eq!(result, 7);
    assert_eq!(observer.get_value("res").await.unwrap(), None);
}

#[tokio::test]
async fn test_using_propagates_section_failure_after_release() {
    setup();
    let (service, backends) = service(1).await;
    let observer = backends[0].clone();

    let result: Result<(), String> = service
        .using("res", UsingOptions::default(), |_signal| async move { Err("boom".to_string()) })
        .await
        .unwrap();

    assert_eq!(result, Err("boom".to_string()));
    assert_eq!(observer.get_value("res").await.unwrap(), None);
}

#[tokio::test]
async fn test_acquire_retries_until_held_lock_expires() {
    setup();
    let (service, backends) = service(1).await;

    backends[0].set_if_absent("res", "foreign-holder", Duration::from_millis(150)).await.unwrap();

    let options = UsingOptions::new().retry_attempts(10).retry_delay(Duration::from_millis(50));
    let result = service.using("res", options, |_signal| async move { "done" }).await.unwrap();
    assert_eq!(result, "done");
}

#[tokio::test]
async fn test_acquire_exhausts_retry_budget() {
    setup();
    let config = LockConfig {
        retry_attempts: 2,
        retry_delay: Duration::from_millis(10),
        ..LockConfig::default()
    };
    let (service, backends) = service_with(1, config).await;

    backends[0].set_if_absent("res", "foreign-holder", Duration::from_secs(60)).await.unwrap();

    let err = service.acquire("res", None).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to acquire lock 'res' after 2 attempts");
}

#[tokio::test]
async fn test_shutdown_is_idempotent_and_clears_retained_cache() {
    setup();
    let (service, _backends) = service(1).await;

    service.acquire("res", None).await.unwrap();
    assert!(service.retained_handle("res").is_some());

    service.shutdown().await;
    service.shutdown().await;
    assert!(service.retained_handle("res").is_none());

    let err = service.acquire("res", None).await.unwrap_err();
    assert!(matches!(err, DistributedLockError::NotInitialized));
}

#[tokio::test]
async fn test_same_key_sections_are_serialized() {
    setup();
    let (service, _backends) = service(1).await;
    let service = Arc::new(service);
    let events: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let first = {
        let service = service.clone();
        let events = events.clone();
        tokio::spawn(async move {
            service
                .using("res", UsingOptions::default(), |_signal| async move {
                    events.lock().push("first-start");
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    events.lock().push("first-end");
                })
                .await
                .unwrap();
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = {
        let service = service.clone();
        let events = events.clone();
        tokio::spawn(async move {
            let options = UsingOptions::new().retry_attempts(20).retry_delay(Duration::from_millis(50));
            service
                .using("res", options, |_signal| async move {
                    events.lock().push("second-start");
                    events.lock().push("second-end");
                })
                .await
                .unwrap();
        })
    };

    first.await.unwrap();
    second.await.unwrap();

    let events = events.lock();
    assert_eq!(*events, vec!["first-start", "first-end", "second-start", "second-end"]);
}

#[tokio::test]
async fn test_different_keys_overlap() {
    setup();
    let (service, _backends) = service(1).await;
    let service = Arc::new(service);
    let events: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let first = {
        let service = service.clone();
        let events = events.clone();
        tokio::spawn(async move {
            service
                .using("res-a", UsingOptions::default(), |_signal| async move {
                    events.lock().push("a-start");
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    events.lock().push("a-end");
                })
                .await
                .unwrap();
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = {
        let service = service.clone();
        let events = events.clone();
        tokio::spawn(async move {
            service
                .using("res-b", UsingOptions::default(), |_signal| async move {
                    events.lock().push("b-start");
                })
                .await
                .unwrap();
        })
    };

    first.await.unwrap();
    second.await.unwrap();

    let events = events.lock();
    let b_start = events.iter().position(|e| *e == "b-start").unwrap();
    let a_end = events.iter().position(|e| *e == "a-end").unwrap();
    assert!(b_start < a_end, "sections on different keys should overlap: {:?}", *events);
}

#[tokio::test]
async fn test_keep_alive_extends_lock_beyond_its_ttl() {
    setup();
    let (service, backends) = service(1).await;
    let observer = backends[0].clone();

    let options = UsingOptions::new().ttl(Duration::from_millis(150));
    service
        .using("res", options, |signal| async move {
            tokio::time::sleep(Duration::from_millis(400)).await;
            // Well past the original TTL: the keep-alive must have refreshed it
            assert!(observer.get_value("res").await.unwrap().is_some());
            assert!(!signal.is_lost());
        })
        .await
        .unwrap();

    assert_eq!(backends[0].get_value("res").await.unwrap(), None);
}

#[tokio::test]
async fn test_extension_failure_raises_lock_signal() {
    setup();
    let (service, backends) = service(1).await;
    let observer = backends[0].clone();

    let options = UsingOptions::new().ttl(Duration::from_millis(150));
    service
        .using("res", options, |signal| async move {
            // Simulate losing the lock to expiry plus takeover
            let value = observer.get_value("res").await.unwrap().unwrap();
            observer.delete_if_match("res", &value).await.unwrap();

            tokio::time::timeout(Duration::from_secs(1), signal.lost())
                .await
                .expect("keep-alive should signal lost ownership");
            assert!(signal.is_lost());
        })
        .await
        .unwrap();
}
