//! Tests for [`FetchCoordinator`] — single-flight read-through caching.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use vault_cache::source::ArtifactSource;
use vault_cache::{
    Artifact, ArtifactKind, CacheConfig, CertificateBundle, FetchCoordinator, JsonWebKey,
    KeyBundle, LockRetention, LockTimeoutPolicy, Result, SecretBundle, VaultCacheError,
};

// ============================================================================
// Mock source
// ============================================================================

/// Deterministic store: every key exists under every kind, except
///
/// - `missing-*` → `NotFound`
/// - `empty-*` → `Ok(None)`
/// - `wrong-kind` → always a key, whatever was asked for
struct MockSource {
    latency: Duration,
    fetches: AtomicU32,
    /// Number of upcoming fetches that fail with an HTTP error.
    failures: AtomicU32,
}

impl MockSource {
    fn new(latency: Duration) -> Self {
        Self {
            latency,
            fetches: AtomicU32::new(0),
            failures: AtomicU32::new(0),
        }
    }

    fn failing_first(self, n: u32) -> Self {
        self.failures.store(n, Ordering::SeqCst);
        self
    }

    fn fetches(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, key: &str, kind: ArtifactKind) -> Result<Option<Artifact>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;

        let should_fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(VaultCacheError::Http("connection reset".into()));
        }
        if key.starts_with("missing") {
            return Err(VaultCacheError::NotFound(key.to_string()));
        }
        if key.starts_with("empty") {
            return Ok(None);
        }
        if key == "wrong-kind" {
            return Ok(Some(make_key(key)));
        }
        Ok(Some(match kind {
            ArtifactKind::Secret => SecretBundle::new(key, format!("{key}-value")).into(),
            ArtifactKind::Certificate => CertificateBundle::new(key, key.as_bytes().to_vec()).into(),
            ArtifactKind::Key => make_key(key),
        }))
    }
}

fn make_key(id: &str) -> Artifact {
    KeyBundle::new(
        id,
        JsonWebKey {
            kty: "RSA".into(),
            ..Default::default()
        },
    )
    .into()
}

fn setup(latency: Duration, config: CacheConfig) -> (Arc<MockSource>, Arc<FetchCoordinator>) {
    let source = Arc::new(MockSource::new(latency));
    let coordinator = Arc::new(FetchCoordinator::new(source.clone(), &config));
    (source, coordinator)
}

const LATENCY: Duration = Duration::from_millis(100);

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn cached_read_is_faster_and_identical() {
    let (source, coordinator) = setup(LATENCY, CacheConfig::default());

    let start = Instant::now();
    let uncached = coordinator
        .get_artifact("secret1", ArtifactKind::Secret, true)
        .await
        .unwrap();
    let uncached_elapsed = start.elapsed();

    let start = Instant::now();
    let cached = coordinator
        .get_artifact("secret1", ArtifactKind::Secret, false)
        .await
        .unwrap();
    let cached_elapsed = start.elapsed();

    assert_eq!(uncached, cached);
    assert!(cached_elapsed < uncached_elapsed);
    assert!(uncached_elapsed >= LATENCY);
    assert_eq!(source.fetches(), 1);
}

#[tokio::test]
async fn entries_expire_after_caching_duration() {
    let config = CacheConfig::new().caching_duration(Duration::from_millis(300));
    let (source, coordinator) = setup(Duration::from_millis(20), config);

    let first = coordinator
        .get_artifact("secret1", ArtifactKind::Secret, true)
        .await
        .unwrap();
    let second = coordinator
        .get_artifact("secret1", ArtifactKind::Secret, false)
        .await
        .unwrap();
    assert_eq!(source.fetches(), 1);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(coordinator.cached("secret1").is_none());

    let third = coordinator
        .get_artifact("secret1", ArtifactKind::Secret, false)
        .await
        .unwrap();
    assert_eq!(source.fetches(), 2, "expired entry must be refetched");
    assert_eq!(first, second);
    assert_eq!(third, second);
}

#[tokio::test]
async fn zero_duration_never_expires() {
    let (source, coordinator) = setup(Duration::ZERO, CacheConfig::default());
    coordinator
        .get_artifact("k", ArtifactKind::Secret, false)
        .await
        .unwrap();
    let entry = coordinator.cached("k").unwrap();
    assert!(entry.expires_at.is_none());

    tokio::time::sleep(Duration::from_millis(50)).await;
    coordinator
        .get_artifact("k", ArtifactKind::Secret, false)
        .await
        .unwrap();
    assert_eq!(source.fetches(), 1);
}

#[tokio::test]
async fn forced_refetch_bypasses_cache() {
    let (source, coordinator) = setup(Duration::ZERO, CacheConfig::default());
    coordinator
        .get_artifact("k", ArtifactKind::Secret, false)
        .await
        .unwrap();
    coordinator
        .get_artifact("k", ArtifactKind::Secret, true)
        .await
        .unwrap();
    assert_eq!(source.fetches(), 2);
    assert!(coordinator.cached("k").is_some());
}

#[tokio::test]
async fn keys_are_not_normalised() {
    let (source, coordinator) = setup(Duration::ZERO, CacheConfig::default());
    coordinator
        .get_artifact("Secret1", ArtifactKind::Secret, false)
        .await
        .unwrap();
    coordinator
        .get_artifact("secret1", ArtifactKind::Secret, false)
        .await
        .unwrap();
    assert_eq!(source.fetches(), 2);
}

// ============================================================================
// Single-flight
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_fetch() {
    let (source, coordinator) = setup(LATENCY, CacheConfig::default());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .get_artifact("shared", ArtifactKind::Secret, false)
                    .await
            })
        })
        .collect();

    let mut results = Vec::new();
    for h in handles {
        results.push(h.await.expect("task panicked").unwrap());
    }

    assert_eq!(source.fetches(), 1, "exactly one remote fetch");
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_keys_fetch_in_parallel() {
    let latency = Duration::from_millis(200);
    let (source, coordinator) = setup(latency, CacheConfig::default());

    let start = Instant::now();
    let (a, b) = tokio::join!(
        coordinator.get_artifact("alpha", ArtifactKind::Secret, false),
        coordinator.get_artifact("beta", ArtifactKind::Secret, false),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(source.fetches(), 2);
    assert!(
        start.elapsed() < latency * 2,
        "different keys must not serialise"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_fetch_is_not_shared_with_waiters() {
    let source = Arc::new(MockSource::new(LATENCY).failing_first(1));
    let coordinator = Arc::new(FetchCoordinator::new(source.clone(), &CacheConfig::default()));

    let winner = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            coordinator
                .get_artifact("flaky", ArtifactKind::Secret, false)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let waiter = coordinator
        .get_artifact("flaky", ArtifactKind::Secret, false)
        .await;

    let winner = winner.await.expect("task panicked");
    assert!(matches!(winner, Err(VaultCacheError::Http(_))));
    assert!(waiter.is_ok(), "waiter fetches for itself after the failure");
    assert_eq!(source.fetches(), 2);
}

// ============================================================================
// Lock timeouts
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lock_timeout_fails_under_fail_policy() {
    let config = CacheConfig::new()
        .lock_wait(Duration::from_millis(50))
        .lock_timeout(LockTimeoutPolicy::Fail);
    let (source, coordinator) = setup(Duration::from_millis(300), config);

    let slow = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            coordinator
                .get_artifact("slow", ArtifactKind::Secret, false)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    match coordinator
        .get_artifact("slow", ArtifactKind::Secret, false)
        .await
    {
        Err(VaultCacheError::LockTimeout { key, waited }) => {
            assert_eq!(key, "slow");
            assert_eq!(waited, Duration::from_millis(50));
        }
        other => panic!("expected LockTimeout, got {other:?}"),
    }

    assert!(slow.await.expect("task panicked").is_ok());
    assert_eq!(source.fetches(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lock_timeout_proceeds_under_default_policy() {
    let config = CacheConfig::new().lock_wait(Duration::from_millis(50));
    let (source, coordinator) = setup(Duration::from_millis(300), config);

    let slow = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            coordinator
                .get_artifact("slow", ArtifactKind::Secret, false)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let impatient = coordinator
        .get_artifact("slow", ArtifactKind::Secret, false)
        .await;
    assert!(impatient.is_ok());
    assert!(slow.await.expect("task panicked").is_ok());
    assert_eq!(
        source.fetches(),
        2,
        "a timed-out caller fetches without exclusive access"
    );
}

// ============================================================================
// Removal and clearing
// ============================================================================

#[tokio::test]
async fn removal_forces_refetch() {
    let (source, coordinator) = setup(Duration::ZERO, CacheConfig::default());
    coordinator
        .get_artifact("k", ArtifactKind::Secret, false)
        .await
        .unwrap();

    coordinator.remove("k").await;
    assert!(coordinator.cached("k").is_none());

    coordinator
        .get_artifact("k", ArtifactKind::Secret, false)
        .await
        .unwrap();
    assert_eq!(source.fetches(), 2);
}

#[tokio::test]
async fn removing_absent_key_leaves_others_alone() {
    let (_source, coordinator) = setup(Duration::ZERO, CacheConfig::default());
    coordinator
        .get_artifact("kept", ArtifactKind::Secret, false)
        .await
        .unwrap();

    coordinator.remove("never-cached").await;
    coordinator.remove("never-cached").await;

    assert!(coordinator.cached("kept").is_some());
    assert_eq!(coordinator.cached_keys(), vec!["kept".to_string()]);
}

#[tokio::test]
async fn clear_forces_refetch_for_all_keys() {
    let (source, coordinator) = setup(Duration::ZERO, CacheConfig::default());
    coordinator
        .get_artifact("one", ArtifactKind::Secret, false)
        .await
        .unwrap();
    coordinator
        .get_artifact("two", ArtifactKind::Certificate, false)
        .await
        .unwrap();

    coordinator.clear().await;
    assert!(coordinator.cached_keys().is_empty());

    coordinator
        .get_artifact("one", ArtifactKind::Secret, false)
        .await
        .unwrap();
    coordinator
        .get_artifact("two", ArtifactKind::Certificate, false)
        .await
        .unwrap();
    assert_eq!(source.fetches(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn remove_waits_for_in_flight_fetch() {
    let (_source, coordinator) = setup(Duration::from_millis(200), CacheConfig::default());

    let fetch = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            coordinator
                .get_artifact("k", ArtifactKind::Secret, false)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    coordinator.remove("k").await;
    assert!(fetch.await.expect("task panicked").is_ok());
    assert!(
        coordinator.cached("k").is_none(),
        "removal ran after the fetch stored its result"
    );
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn kind_mismatch_on_cache_hit() {
    let (source, coordinator) = setup(Duration::ZERO, CacheConfig::default());
    coordinator
        .get_artifact("secret1", ArtifactKind::Secret, false)
        .await
        .unwrap();

    let err = coordinator
        .get_artifact("secret1", ArtifactKind::Certificate, false)
        .await
        .unwrap_err();
    match err {
        VaultCacheError::TypeMismatch {
            key,
            expected,
            stored,
        } => {
            assert_eq!(key, "secret1");
            assert_eq!(expected, ArtifactKind::Certificate);
            assert_eq!(stored, ArtifactKind::Secret);
        }
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
    assert_eq!(source.fetches(), 1, "no remote fetch on a mismatch");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn kind_mismatch_after_waiting_on_a_fetch() {
    let (source, coordinator) = setup(LATENCY, CacheConfig::default());

    let winner = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            coordinator
                .get_artifact("shared", ArtifactKind::Secret, false)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let waiter = coordinator
        .get_artifact("shared", ArtifactKind::Certificate, false)
        .await;

    assert!(winner.await.expect("task panicked").is_ok());
    match waiter {
        Err(VaultCacheError::TypeMismatch {
            expected, stored, ..
        }) => {
            assert_eq!(expected, ArtifactKind::Certificate);
            assert_eq!(stored, ArtifactKind::Secret);
        }
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
    assert_eq!(source.fetches(), 1, "waiter reuses the winner's entry");
}

#[tokio::test]
async fn source_failure_propagates_and_is_not_cached() {
    let (source, coordinator) = setup(Duration::ZERO, CacheConfig::default());

    for _ in 0..2 {
        let err = coordinator
            .get_artifact("missing-secret", ArtifactKind::Secret, false)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultCacheError::NotFound(ref k) if k == "missing-secret"));
    }
    assert!(coordinator.cached("missing-secret").is_none());
    assert_eq!(source.fetches(), 2, "no negative caching, no retry");
}

#[tokio::test]
async fn empty_result_is_an_error() {
    let (_source, coordinator) = setup(Duration::ZERO, CacheConfig::default());
    let err = coordinator
        .get_artifact("empty-cert", ArtifactKind::Certificate, false)
        .await
        .unwrap_err();
    match err {
        VaultCacheError::SourceReturnedEmpty { key, kind } => {
            assert_eq!(key, "empty-cert");
            assert_eq!(kind, ArtifactKind::Certificate);
        }
        other => panic!("expected SourceReturnedEmpty, got {other:?}"),
    }
    assert!(coordinator.cached("empty-cert").is_none());
}

#[tokio::test]
async fn source_returning_other_kind_is_rejected() {
    let (_source, coordinator) = setup(Duration::ZERO, CacheConfig::default());
    let err = coordinator
        .get_artifact("wrong-kind", ArtifactKind::Secret, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VaultCacheError::TypeMismatch {
            stored: ArtifactKind::Key,
            ..
        }
    ));
    assert!(coordinator.cached("wrong-kind").is_none());
}

#[tokio::test]
async fn failed_forced_refetch_drops_old_entry() {
    let source = Arc::new(MockSource::new(Duration::ZERO));
    let coordinator = FetchCoordinator::new(source.clone(), &CacheConfig::default());
    coordinator
        .get_artifact("k", ArtifactKind::Secret, false)
        .await
        .unwrap();

    source.failures.store(1, Ordering::SeqCst);
    assert!(
        coordinator
            .get_artifact("k", ArtifactKind::Secret, true)
            .await
            .is_err()
    );
    assert!(coordinator.cached("k").is_none());
}

// ============================================================================
// Lock retention
// ============================================================================

#[tokio::test]
async fn retained_locks_accumulate_per_key() {
    let (_source, coordinator) = setup(Duration::ZERO, CacheConfig::default());
    for key in ["a", "b", "c"] {
        coordinator
            .get_artifact(key, ArtifactKind::Secret, false)
            .await
            .unwrap();
    }
    coordinator.remove("a").await;
    assert_eq!(coordinator.lock_count(), 3);
}

#[tokio::test]
async fn reclaimed_locks_are_dropped_after_use() {
    let config = CacheConfig::new().lock_retention(LockRetention::Reclaim);
    let (_source, coordinator) = setup(Duration::ZERO, config);
    for key in ["a", "b", "c"] {
        coordinator
            .get_artifact(key, ArtifactKind::Secret, false)
            .await
            .unwrap();
    }
    coordinator.clear().await;
    assert_eq!(coordinator.lock_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reclaimed_locks_still_single_flight() {
    let config = CacheConfig::new().lock_retention(LockRetention::Reclaim);
    let (source, coordinator) = setup(LATENCY, config);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .get_artifact("shared", ArtifactKind::Key, false)
                    .await
            })
        })
        .collect();
    for h in handles {
        h.await.expect("task panicked").unwrap();
    }

    assert_eq!(source.fetches(), 1);
    assert_eq!(coordinator.lock_count(), 0);
}
