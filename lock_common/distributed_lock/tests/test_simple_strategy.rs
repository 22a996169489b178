use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use distributed_lock::{
    LockConfig, LockHandle, LockService, LockStrategy, RetryPolicy, SimpleStrategy, StrategyKind,
};
use lock_backend::{BackendAdapter, BackendError, MemoryBackend};
use mockall::mock;

mock! {
    pub Backend {}

    #[async_trait]
    impl BackendAdapter for Backend {
        async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> lock_backend::Result<bool>;
        async fn get_value(&self, key: &str) -> lock_backend::Result<Option<String>>;
        async fn delete_if_match(&self, key: &str, value: &str) -> lock_backend::Result<bool>;
        async fn extend_if_match(&self, key: &str, value: &str, ttl: Duration) -> lock_backend::Result<bool>;
        async fn liveness_check(&self) -> lock_backend::Result<()>;
        async fn disconnect(&self) -> lock_backend::Result<()>;
    }
}

fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[tokio::test]
async fn test_acquire_sets_value_on_primary() {
    setup();
    let backend = MemoryBackend::new();
    let strategy = SimpleStrategy::new(Arc::new(backend.clone()));
    assert_eq!(strategy.kind(), StrategyKind::Simple);

    let retry = RetryPolicy { attempts: 1, delay: Duration::from_millis(10) };
    let handle = strategy.acquire("res", Duration::from_secs(30), &retry).await.unwrap();

    assert_eq!(backend.get_value("res").await.unwrap(), Some(handle.value.clone()));
    assert_eq!(handle.metadata.strategy, StrategyKind::Simple);
}

#[tokio::test]
async fn test_two_node_topology_locks_only_the_primary() {
    setup();
    let backends: Vec<MemoryBackend> = (0..2).map(|_| MemoryBackend::new()).collect();
    let adapters: Vec<Arc<dyn BackendAdapter>> =
        backends.iter().map(|b| Arc::new(b.clone()) as Arc<dyn BackendAdapter>).collect();
    let service = LockService::new(adapters, LockConfig::default()).unwrap();
    service.init().await.unwrap();

    let handle = service.acquire("res", None).await.unwrap();

    assert_eq!(backends[0].get_value("res").await.unwrap(), Some(handle.value.clone()));
    assert_eq!(backends[1].get_value("res").await.unwrap(), None);
}

#[tokio::test]
async fn test_acquire_retries_until_foreign_lock_expires() {
    setup();
    let backend = MemoryBackend::new();
    backend.set_if_absent("res", "foreign-holder", Duration::from_millis(120)).await.unwrap();
    let strategy = SimpleStrategy::new(Arc::new(backend.clone()));

    let retry = RetryPolicy { attempts: 5, delay: Duration::from_millis(50) };
    let handle = strategy.acquire("res", Duration::from_secs(30), &retry).await.unwrap();

    assert_eq!(backend.get_value("res").await.unwrap(), Some(handle.value));
}

#[tokio::test]
async fn test_acquire_exhausts_attempts_against_held_lock() {
    setup();
    let backend = MemoryBackend::new();
    backend.set_if_absent("res", "foreign-holder", Duration::from_secs(60)).await.unwrap();
    let strategy = SimpleStrategy::new(Arc::new(backend));

    let retry = RetryPolicy { attempts: 3, delay: Duration::from_millis(10) };
    let err = strategy.acquire("res", Duration::from_secs(30), &retry).await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to acquire lock 'res' after 3 attempts");
}

#[tokio::test]
async fn test_release_of_unheld_lock_is_not_an_error() {
    setup();
    let backend = MemoryBackend::new();
    let strategy = SimpleStrategy::new(Arc::new(backend));

    let stale = LockHandle::new("res", "stale-value", Duration::from_secs(30), StrategyKind::Simple);
    assert!(!strategy.release(&stale).await.unwrap());
}

#[tokio::test]
async fn test_release_surfaces_backend_failure() {
    setup();
    let mut mock = MockBackend::new();
    mock.expect_delete_if_match()
        .returning(|_, _| Err(BackendError::OperationError("node down".to_string())));
    let strategy = SimpleStrategy::new(Arc::new(mock));

    let handle = LockHandle::new("res", "some-value", Duration::from_secs(30), StrategyKind::Simple);
    let err = strategy.release(&handle).await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to release lock 'res': Backend operation error: node down");
}

#[tokio::test]
async fn test_extend_reports_lost_ownership() {
    setup();
    let backend = MemoryBackend::new();
    let strategy = SimpleStrategy::new(Arc::new(backend.clone()));

    let retry = RetryPolicy { attempts: 1, delay: Duration::from_millis(10) };
    let handle = strategy.acquire("res", Duration::from_secs(30), &retry).await.unwrap();

    assert!(strategy.extend(&handle, Duration::from_secs(30)).await.unwrap());

    backend.delete_if_match("res", &handle.value).await.unwrap();
    assert!(!strategy.extend(&handle, Duration::from_secs(30)).await.unwrap());
}
