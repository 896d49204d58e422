//! End-to-end behaviour of the cacheable repository with real stores and the
//! resilience primitives wired in.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tether_cache::{
    fallible, CacheEntry, CacheStore, CacheableRepository, FileStore, MemoryStore,
    RepositoryConfigBuilder,
};
use tether_core::{
    Failure, FailureKind, ManualClock, Outcome, RecordingSink, EVENT_CIRCUIT_REJECTED,
    EVENT_RETRY_ATTEMPT,
};
use tether_utils::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryPolicy};

const TTL_MS: u64 = 60_000;

fn counting<T>(
    calls: &Arc<AtomicUsize>,
    outcome: Outcome<T>,
) -> impl Fn() -> std::future::Ready<Outcome<T>> + Send + Sync
where
    T: Clone + Send + Sync,
{
    let calls = Arc::clone(calls);
    move || {
        calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(outcome.clone())
    }
}

#[tokio::test]
async fn fresh_cache_skips_remote_fetch() {
    let clock = ManualClock::new(1_000_000);
    let calls = Arc::new(AtomicUsize::new(0));
    let store = MemoryStore::with_entry(CacheEntry::new("cached".to_string(), 1_000_000));
    let repo = CacheableRepository::new(
        store,
        counting(&calls, Outcome::Success("remote".to_string())),
        TTL_MS,
    )
    .with_clock(Arc::new(clock.clone()));

    clock.advance(TTL_MS - 1);
    assert_eq!(
        repo.get_data_with_cache_first().await,
        Outcome::Success("cached".to_string())
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn network_first_serves_stale_entry_when_remote_fails() {
    let clock = ManualClock::new(0);
    let calls = Arc::new(AtomicUsize::new(0));
    let store = MemoryStore::with_entry(CacheEntry::new("stale".to_string(), 0));
    let repo = CacheableRepository::new(
        store,
        counting(&calls, Outcome::Error(Failure::no_connection())),
        TTL_MS,
    )
    .with_clock(Arc::new(clock.clone()));

    clock.advance(TTL_MS * 3);
    assert!(!repo.is_cache_valid().await);
    assert_eq!(
        repo.get_data_with_network_first().await,
        Outcome::Success("stale".to_string())
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cache_first_with_empty_cache_surfaces_fetch_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let repo = CacheableRepository::new(
        MemoryStore::<String>::new(),
        counting(&calls, Outcome::Error(Failure::client_error(404, "missing"))),
        TTL_MS,
    );

    let outcome = repo.get_data_with_cache_first().await;
    assert_eq!(
        outcome.failure().map(Failure::kind),
        Some(FailureKind::NetworkClientError)
    );
    assert_eq!(outcome.get_or_none(), None);
}

#[tokio::test(start_paused = true)]
async fn open_breaker_stops_retries_and_network_first_degrades() {
    let clock = ManualClock::new(0);
    let sink = RecordingSink::new();
    let breaker = Arc::new(
        CircuitBreaker::new(CircuitBreakerConfig::new(2, 120_000))
            .with_name("profile-api")
            .with_clock(Arc::new(clock.clone()))
            .with_sink(Arc::new(sink.clone())),
    );
    let calls = Arc::new(AtomicUsize::new(0));
    let store = MemoryStore::with_entry(CacheEntry::new("offline copy".to_string(), 0));
    let repo = CacheableRepository::new(
        store,
        counting(&calls, Outcome::Error(Failure::server_error(500, "boom"))),
        TTL_MS,
    )
    .with_clock(Arc::new(clock.clone()))
    .with_retry_policy(RetryPolicy::new(5, 100, 2.0, 1_000))
    .with_circuit_breaker(Arc::clone(&breaker))
    .with_sink(Arc::new(sink.clone()));

    // Two real failures open the circuit; the third attempt is rejected and
    // circuit-open is not retryable, so the loop stops there
    assert_eq!(
        repo.get_data_with_network_first().await,
        Outcome::Success("offline copy".to_string())
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(breaker.state(), CircuitState::Open);
    assert_eq!(sink.named(EVENT_RETRY_ATTEMPT).len(), 2);
    assert_eq!(sink.named(EVENT_CIRCUIT_REJECTED).len(), 1);

    // Cache-first cannot fall back, so the rejection reaches the caller
    clock.advance(TTL_MS);
    let rejected = repo.get_data_with_cache_first().await;
    assert_eq!(
        rejected.failure().map(Failure::kind),
        Some(FailureKind::ConcurrencyCircuitOpen)
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn file_store_backed_repository_persists_fetches() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("profile.json");
    let config = RepositoryConfigBuilder::new()
        .with_ttl_ms(TTL_MS)
        .build()
        .unwrap()
        .config;

    let repo = CacheableRepository::from_config(
        FileStore::new(&path),
        fallible(|| async { Ok::<_, std::io::Error>(vec![1u32, 2, 3]) }),
        &config,
    )
    .unwrap()
    .with_name("profile");

    assert_eq!(
        repo.get_data_with_cache_first().await,
        Outcome::Success(vec![1, 2, 3])
    );

    let persisted: FileStore<Vec<u32>> = FileStore::new(&path);
    let entry = persisted.get().await.unwrap().unwrap();
    assert_eq!(entry.data, vec![1, 2, 3]);

    assert!(repo.invalidate().await.is_success());
    assert!(!path.exists());
}

#[tokio::test]
async fn concurrent_updates_never_interleave() {
    let store = Arc::new(MemoryStore::new());
    let repo = Arc::new(CacheableRepository::new(
        Arc::clone(&store),
        || std::future::ready(Outcome::Success(Vec::<u8>::new())),
        TTL_MS,
    ));

    let mut handles = Vec::new();
    for i in 0..32u8 {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move {
            repo.update_cache(vec![i; 128]).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_success());
    }

    let cached = repo.get_cached_data().await.get_or_none().flatten().unwrap();
    assert_eq!(cached.len(), 128);
    assert!(cached.iter().all(|b| *b == cached[0]));
}
