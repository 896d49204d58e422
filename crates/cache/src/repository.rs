//! Cache-first and network-first retrieval over a single cached entry.
//!
//! A [`CacheableRepository`] owns one [`CacheStore`] and one [`RemoteFetch`].
//! Remote calls optionally go through a [`RetryController`] and a shared
//! [`CircuitBreaker`]; when both are configured the retry loop is the outer
//! layer, so an open circuit ends the retries.
//!
//! The two strategies differ: cache-first never serves an expired
//! entry, while network-first falls back to whatever entry exists when the
//! remote fetch fails.

use crate::config::RepositoryConfig;
use crate::entry::CacheEntry;
use crate::fetch::RemoteFetch;
use crate::store::CacheStore;
use std::marker::PhantomData;
use std::sync::Arc;
use tether_core::{
    attributes, Clock, Failure, FailureKind, NoopSink, Outcome, Result, SharedSink, SystemClock,
    EVENT_CACHE_HIT, EVENT_CACHE_MISS, EVENT_CACHE_STALE_FALLBACK, EVENT_CACHE_WRITE_FAILED,
};
use tether_utils::{
    CancellationToken, CircuitBreaker, CircuitBreakerConfig, RetryController, RetryPolicy,
};

const DEFAULT_NAME: &str = "repository";

/// Why a cache-first lookup went to the network
#[derive(Debug, Clone, Copy)]
enum MissReason {
    Empty,
    Expired,
    StoreError,
}

impl MissReason {
    const fn as_str(self) -> &'static str {
        match self {
            MissReason::Empty => "empty",
            MissReason::Expired => "expired",
            MissReason::StoreError => "store_error",
        }
    }
}

/// Repository combining a freshness policy, a cache store and a remote fetch
pub struct CacheableRepository<T, S, F> {
    name: String,
    store: S,
    fetcher: F,
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
    retry: Option<RetryPolicy>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
    // Set when the breaker came from configuration and follows our name, clock and sink
    owned_breaker: Option<CircuitBreakerConfig>,
    sink: SharedSink,
    cancellation: CancellationToken,
    _payload: PhantomData<fn() -> T>,
}

impl<T, S, F> CacheableRepository<T, S, F>
where
    T: Clone + Send + Sync + 'static,
    S: CacheStore<T>,
    F: RemoteFetch<T>,
{
    /// Create a repository whose entries stay fresh for `ttl_ms`
    pub fn new(store: S, fetcher: F, ttl_ms: u64) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            store,
            fetcher,
            ttl_ms,
            clock: Arc::new(SystemClock),
            retry: None,
            circuit_breaker: None,
            owned_breaker: None,
            sink: Arc::new(NoopSink),
            cancellation: CancellationToken::new(),
            _payload: PhantomData,
        }
    }

    /// Create a repository from validated configuration.
    ///
    /// A circuit breaker section gets a breaker owned by this repository,
    /// named `<repository>.remote` and sharing the repository's clock and
    /// sink. Use [`with_circuit_breaker`](Self::with_circuit_breaker) instead
    /// to share one between repositories hitting the same dependency.
    pub fn from_config(store: S, fetcher: F, config: &RepositoryConfig) -> Result<Self> {
        config.validate()?;

        let mut repository = Self::new(store, fetcher, config.ttl_ms);
        repository.retry = config.retry.clone();
        repository.owned_breaker = config.circuit_breaker.clone();
        repository.rebuild_owned_breaker();
        Ok(repository)
    }

    /// Name reported in logs and events
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.rebuild_owned_breaker();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self.rebuild_owned_breaker();
        self
    }

    /// Retry failed remote fetches under `policy`
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Route remote fetches through `breaker`
    pub fn with_circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = Some(breaker);
        self.owned_breaker = None;
        self
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self.rebuild_owned_breaker();
        self
    }

    /// Abandon in-flight fetches and backoff waits when `cancellation` fires
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Breaker guarding remote fetches, if any
    pub fn circuit_breaker(&self) -> Option<&CircuitBreaker> {
        self.circuit_breaker.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether a stored entry exists and is younger than the TTL.
    ///
    /// An unreadable store counts as no entry.
    pub async fn is_cache_valid(&self) -> bool {
        match self.store.get().await {
            Ok(Some(entry)) => entry.is_fresh(self.clock.now_ms(), self.ttl_ms),
            Ok(None) => false,
            Err(failure) => {
                tracing::debug!(repository = %self.name, error = %failure, "Cache store unreadable");
                false
            }
        }
    }

    /// Read the stored payload without contacting the remote source.
    ///
    /// Freshness is not checked.
    pub async fn get_cached_data(&self) -> Outcome<Option<T>> {
        match self.store.get().await {
            Ok(entry) => Outcome::Success(entry.map(|entry| entry.data)),
            Err(failure) => Outcome::Error(failure),
        }
    }

    /// Replace the stored entry with `data`, stamped with the current time
    pub async fn update_cache(&self, data: T) -> Outcome<()> {
        let entry = CacheEntry::new(data, self.clock.now_ms());
        Outcome::from(self.store.set(entry).await)
    }

    /// Drop the stored entry
    pub async fn invalidate(&self) -> Outcome<()> {
        tracing::debug!(repository = %self.name, "Invalidating cache");
        Outcome::from(self.store.clear().await)
    }

    /// Age of the stored entry, `None` when the store is empty
    pub async fn cache_age_ms(&self) -> Outcome<Option<u64>> {
        let now = self.clock.now_ms();
        self.get_entry()
            .await
            .map(|entry| entry.map(|entry| entry.age_ms(now)))
    }

    /// Serve a fresh cached entry, fetching only when there is none.
    ///
    /// A fetch failure is returned as is; an expired entry is never used as a
    /// fallback.
    pub async fn get_data_with_cache_first(&self) -> Outcome<T> {
        let now = self.clock.now_ms();
        let reason = match self.store.get().await {
            Ok(Some(entry)) if entry.is_fresh(now, self.ttl_ms) => {
                let age_ms = entry.age_ms(now);
                tracing::debug!(repository = %self.name, age_ms, "Cache hit");
                self.sink.emit(
                    EVENT_CACHE_HIT,
                    &attributes([
                        ("repository", self.name.clone()),
                        ("age_ms", age_ms.to_string()),
                    ]),
                );
                return Outcome::Success(entry.data);
            }
            Ok(Some(_)) => MissReason::Expired,
            Ok(None) => MissReason::Empty,
            Err(failure) => {
                tracing::warn!(
                    repository = %self.name,
                    error = %failure,
                    "Cache store read failed, fetching from remote"
                );
                MissReason::StoreError
            }
        };

        tracing::debug!(repository = %self.name, reason = reason.as_str(), "Cache miss");
        self.sink.emit(
            EVENT_CACHE_MISS,
            &attributes([
                ("repository", self.name.clone()),
                ("reason", reason.as_str().to_string()),
            ]),
        );

        match self.fetch_remote().await {
            Outcome::Success(data) => {
                self.store_fetched(&data).await;
                Outcome::Success(data)
            }
            other => other,
        }
    }

    /// Fetch from the remote source, falling back to any stored entry (fresh
    /// or expired) when the fetch fails.
    ///
    /// Cancellation is surfaced instead of falling back.
    pub async fn get_data_with_network_first(&self) -> Outcome<T> {
        let failure = match self.fetch_remote().await {
            Outcome::Success(data) => {
                self.store_fetched(&data).await;
                return Outcome::Success(data);
            }
            Outcome::InProgress => return Outcome::InProgress,
            Outcome::Error(failure) => failure,
        };

        if failure.kind() == FailureKind::ConcurrencyOperationCancelled {
            return Outcome::Error(failure);
        }

        match self.store.get().await {
            Ok(Some(entry)) => {
                let age_ms = entry.age_ms(self.clock.now_ms());
                tracing::warn!(
                    repository = %self.name,
                    age_ms,
                    error = %failure,
                    "Remote fetch failed, serving cached data"
                );
                self.sink.emit(
                    EVENT_CACHE_STALE_FALLBACK,
                    &attributes([
                        ("repository", self.name.clone()),
                        ("age_ms", age_ms.to_string()),
                        ("failure", failure.code().to_string()),
                    ]),
                );
                Outcome::Success(entry.data)
            }
            Ok(None) => Outcome::Error(failure),
            Err(store_failure) => {
                tracing::warn!(
                    repository = %self.name,
                    error = %store_failure,
                    "Cache store unreadable during fallback"
                );
                Outcome::Error(failure)
            }
        }
    }

    /// Builders run before any call, so replacing the owned breaker loses no state
    fn rebuild_owned_breaker(&mut self) {
        if let Some(config) = &self.owned_breaker {
            let breaker = CircuitBreaker::new(config.clone())
                .with_name(format!("{}.remote", self.name))
                .with_clock(Arc::clone(&self.clock))
                .with_sink(Arc::clone(&self.sink));
            self.circuit_breaker = Some(Arc::new(breaker));
        }
    }

    async fn get_entry(&self) -> Outcome<Option<CacheEntry<T>>> {
        Outcome::from(self.store.get().await)
    }

    /// Write a freshly fetched payload; a failed write is reported but does
    /// not fail the caller, who already has the data.
    async fn store_fetched(&self, data: &T) {
        if let Outcome::Error(failure) = self.update_cache(data.clone()).await {
            tracing::warn!(repository = %self.name, error = %failure, "Failed to update cache");
            self.sink.emit(
                EVENT_CACHE_WRITE_FAILED,
                &attributes([
                    ("repository", self.name.clone()),
                    ("failure", failure.code().to_string()),
                ]),
            );
        }
    }

    async fn fetch_remote(&self) -> Outcome<T> {
        let fetcher = &self.fetcher;
        let cancellation = &self.cancellation;

        match (&self.retry, self.circuit_breaker.as_deref()) {
            (Some(policy), Some(breaker)) => {
                self.retry_controller(policy)
                    .run(move || {
                        breaker.execute_with_cancellation(cancellation, move || fetcher.fetch())
                    })
                    .await
            }
            (Some(policy), None) => self.retry_controller(policy).run(move || fetcher.fetch()).await,
            (None, Some(breaker)) => {
                breaker
                    .execute_with_cancellation(cancellation, || fetcher.fetch())
                    .await
            }
            (None, None) => {
                tokio::select! {
                    biased;
                    _ = cancellation.cancelled() => {
                        Outcome::Error(Failure::cancelled(self.name.clone()))
                    }
                    outcome = fetcher.fetch() => outcome,
                }
            }
        }
    }

    fn retry_controller(&self, policy: &RetryPolicy) -> RetryController {
        RetryController::new(policy.clone())
            .with_name(self.name.clone())
            .with_sink(Arc::clone(&self.sink))
            .with_cancellation(self.cancellation.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tether_core::{
        ManualClock, RecordingSink, EVENT_CIRCUIT_REJECTED, EVENT_CIRCUIT_STATE_CHANGED,
    };

    const TTL_MS: u64 = 1_000;

    /// Fetcher that counts calls and replays a fixed outcome
    #[derive(Clone)]
    struct Scripted {
        calls: Arc<AtomicUsize>,
        outcome: Outcome<String>,
    }

    impl Scripted {
        fn new(outcome: Outcome<String>) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                outcome,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn as_fetch(&self) -> impl Fn() -> BoxFuture<'static, Outcome<String>> + Send + Sync {
            let this = self.clone();
            move || {
                this.calls.fetch_add(1, Ordering::SeqCst);
                let outcome = this.outcome.clone();
                async move { outcome }.boxed()
            }
        }
    }

    fn stored(data: &str, at_ms: u64) -> MemoryStore<String> {
        MemoryStore::with_entry(CacheEntry::new(data.to_string(), at_ms))
    }

    #[tokio::test]
    async fn test_validity_follows_ttl() {
        let clock = ManualClock::new(10_000);
        let fetch = Scripted::new(Outcome::Success("remote".into()));
        let repo = CacheableRepository::new(stored("cached", 10_000), fetch.as_fetch(), TTL_MS)
            .with_clock(Arc::new(clock.clone()));

        assert!(repo.is_cache_valid().await);
        clock.advance(999);
        assert!(repo.is_cache_valid().await);
        clock.advance(1);
        assert!(!repo.is_cache_valid().await);
        assert_eq!(fetch.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_cache_is_invalid() {
        let fetch = Scripted::new(Outcome::Success("remote".into()));
        let repo = CacheableRepository::new(MemoryStore::new(), fetch.as_fetch(), TTL_MS);

        assert!(!repo.is_cache_valid().await);
        assert_eq!(repo.get_cached_data().await, Outcome::Success(None));
        assert_eq!(repo.cache_age_ms().await, Outcome::Success(None));
    }

    #[tokio::test]
    async fn test_update_cache_stamps_current_time() {
        let clock = ManualClock::new(5_000);
        let fetch = Scripted::new(Outcome::Success("remote".into()));
        let repo = CacheableRepository::new(MemoryStore::new(), fetch.as_fetch(), TTL_MS)
            .with_clock(Arc::new(clock.clone()));

        assert!(repo.update_cache("local".to_string()).await.is_success());
        clock.advance(250);

        assert_eq!(
            repo.get_cached_data().await,
            Outcome::Success(Some("local".to_string()))
        );
        assert_eq!(repo.cache_age_ms().await, Outcome::Success(Some(250)));
    }

    #[tokio::test]
    async fn test_cache_first_fetches_expired_entry_and_refreshes() {
        let clock = ManualClock::new(0);
        let sink = RecordingSink::new();
        let fetch = Scripted::new(Outcome::Success("remote".into()));
        let repo = CacheableRepository::new(stored("cached", 0), fetch.as_fetch(), TTL_MS)
            .with_clock(Arc::new(clock.clone()))
            .with_sink(Arc::new(sink.clone()));

        clock.advance(TTL_MS);
        assert_eq!(
            repo.get_data_with_cache_first().await,
            Outcome::Success("remote".to_string())
        );
        assert_eq!(fetch.calls(), 1);
        assert_eq!(
            sink.named(EVENT_CACHE_MISS)[0].attribute("reason"),
            Some("expired")
        );

        // Refreshed entry is served without another fetch
        assert_eq!(
            repo.get_data_with_cache_first().await,
            Outcome::Success("remote".to_string())
        );
        assert_eq!(fetch.calls(), 1);
        assert_eq!(sink.named(EVENT_CACHE_HIT).len(), 1);
    }

    #[tokio::test]
    async fn test_cache_first_never_serves_stale_data() {
        let clock = ManualClock::new(0);
        let fetch = Scripted::new(Outcome::Error(Failure::no_connection()));
        let repo = CacheableRepository::new(stored("stale", 0), fetch.as_fetch(), TTL_MS)
            .with_clock(Arc::new(clock.clone()));

        clock.advance(TTL_MS * 10);
        assert_eq!(
            repo.get_data_with_cache_first().await,
            Outcome::Error(Failure::no_connection())
        );
    }

    #[tokio::test]
    async fn test_network_first_prefers_remote() {
        let fetch = Scripted::new(Outcome::Success("remote".into()));
        let repo = CacheableRepository::new(stored("cached", 0), fetch.as_fetch(), TTL_MS)
            .with_clock(Arc::new(ManualClock::new(10)));

        assert_eq!(
            repo.get_data_with_network_first().await,
            Outcome::Success("remote".to_string())
        );
        assert_eq!(
            repo.get_cached_data().await,
            Outcome::Success(Some("remote".to_string()))
        );
        assert_eq!(repo.cache_age_ms().await, Outcome::Success(Some(0)));
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_stale_entry() {
        let clock = ManualClock::new(0);
        let sink = RecordingSink::new();
        let fetch = Scripted::new(Outcome::Error(Failure::server_error(503, "unavailable")));
        let repo = CacheableRepository::new(stored("stale", 0), fetch.as_fetch(), TTL_MS)
            .with_clock(Arc::new(clock.clone()))
            .with_sink(Arc::new(sink.clone()));

        clock.advance(TTL_MS * 5);
        assert_eq!(
            repo.get_data_with_network_first().await,
            Outcome::Success("stale".to_string())
        );

        let fallback = sink.named(EVENT_CACHE_STALE_FALLBACK);
        assert_eq!(fallback.len(), 1);
        assert_eq!(fallback[0].attribute("age_ms"), Some("5000"));
        assert_eq!(fallback[0].attribute("failure"), Some("network.server_error"));
    }

    #[tokio::test]
    async fn test_network_first_surfaces_failure_without_cache() {
        let fetch = Scripted::new(Outcome::Error(Failure::no_connection()));
        let repo = CacheableRepository::new(MemoryStore::new(), fetch.as_fetch(), TTL_MS);

        assert_eq!(
            repo.get_data_with_network_first().await,
            Outcome::Error(Failure::no_connection())
        );
    }

    #[tokio::test]
    async fn test_in_progress_is_passed_through() {
        let fetch = Scripted::new(Outcome::InProgress);
        let repo = CacheableRepository::new(stored("cached", 0), fetch.as_fetch(), TTL_MS)
            .with_clock(Arc::new(ManualClock::new(TTL_MS)));

        assert_eq!(repo.get_data_with_network_first().await, Outcome::InProgress);
        assert_eq!(repo.get_data_with_cache_first().await, Outcome::InProgress);
        assert_eq!(
            repo.get_cached_data().await,
            Outcome::Success(Some("cached".to_string()))
        );
    }

    #[tokio::test]
    async fn test_invalidate_forces_fetch() {
        let fetch = Scripted::new(Outcome::Success("remote".into()));
        let repo = CacheableRepository::new(stored("cached", 0), fetch.as_fetch(), TTL_MS)
            .with_clock(Arc::new(ManualClock::new(0)));

        assert!(repo.invalidate().await.is_success());
        assert!(!repo.is_cache_valid().await);
        assert_eq!(
            repo.get_data_with_cache_first().await,
            Outcome::Success("remote".to_string())
        );
        assert_eq!(fetch.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_policy_applies_to_fetch() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let fetch = move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Outcome::Error(Failure::network_timeout(500))
                } else {
                    Outcome::Success("third time".to_string())
                }
            }
        };
        let repo = CacheableRepository::new(MemoryStore::new(), fetch, TTL_MS)
            .with_retry_policy(RetryPolicy::new(3, 100, 2.0, 1_000));

        assert_eq!(
            repo.get_data_with_cache_first().await,
            Outcome::Success("third time".to_string())
        );
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_does_not_fall_back() {
        let token = CancellationToken::new();
        token.cancel();
        let repo = CacheableRepository::new(
            stored("cached", 0),
            || std::future::pending::<Outcome<String>>(),
            TTL_MS,
        )
        .with_cancellation(token);

        assert_eq!(
            repo.get_data_with_network_first()
                .await
                .failure()
                .map(Failure::kind),
            Some(FailureKind::ConcurrencyOperationCancelled)
        );
    }

    #[tokio::test]
    async fn test_configured_breaker_follows_repository_sink_and_clock() {
        let clock = ManualClock::new(0);
        let sink = RecordingSink::new();
        let config = RepositoryConfig {
            circuit_breaker: Some(CircuitBreakerConfig::new(1, 500)),
            ..RepositoryConfig::default()
        };
        let fetch = Scripted::new(Outcome::Error(Failure::no_connection()));
        let repo = CacheableRepository::from_config(MemoryStore::new(), fetch.as_fetch(), &config)
            .unwrap()
            .with_sink(Arc::new(sink.clone()))
            .with_clock(Arc::new(clock.clone()))
            .with_name("profile");

        assert!(repo.get_data_with_network_first().await.is_error());
        let rejected = repo.get_data_with_network_first().await;
        assert_eq!(
            rejected.failure().map(Failure::kind),
            Some(FailureKind::ConcurrencyCircuitOpen)
        );
        assert_eq!(fetch.calls(), 1);

        let changes = sink.named(EVENT_CIRCUIT_STATE_CHANGED);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].attribute("breaker"), Some("profile.remote"));
        assert_eq!(changes[0].attribute("to"), Some("open"));
        assert_eq!(sink.named(EVENT_CIRCUIT_REJECTED).len(), 1);

        // Recovery is timed by the repository's clock
        clock.advance(500);
        assert!(repo.get_data_with_network_first().await.is_error());
        assert_eq!(fetch.calls(), 2);
        assert_eq!(
            repo.circuit_breaker().map(CircuitBreaker::state),
            Some(tether_utils::CircuitState::Open)
        );
    }

    /// Store whose writes always fail
    struct ReadOnlyStore(MemoryStore<String>);

    #[async_trait::async_trait]
    impl CacheStore<String> for ReadOnlyStore {
        async fn get(&self) -> Result<Option<CacheEntry<String>>> {
            self.0.get().await
        }

        async fn set(&self, _entry: CacheEntry<String>) -> Result<()> {
            Err(Failure::insufficient_space())
        }

        async fn clear(&self) -> Result<()> {
            self.0.clear().await
        }
    }

    #[tokio::test]
    async fn test_write_failure_still_returns_fetched_data() {
        let sink = RecordingSink::new();
        let fetch = Scripted::new(Outcome::Success("remote".into()));
        let repo =
            CacheableRepository::new(ReadOnlyStore(MemoryStore::new()), fetch.as_fetch(), TTL_MS)
                .with_sink(Arc::new(sink.clone()));

        assert_eq!(
            repo.get_data_with_cache_first().await,
            Outcome::Success("remote".to_string())
        );
        let failed = sink.named(EVENT_CACHE_WRITE_FAILED);
        assert_eq!(failed[0].attribute("failure"), Some("storage.insufficient_space"));
    }
}
