//! Telemetry metric name constants.
//!
//! Centralised metric names for cache operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `vault_cache_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `kind` — artifact kind: "secret", "certificate" or "key"
//! - `status` — outcome: "ok", "empty", "mismatch" or "error"
//! - `operation` — "get" or "remove"

/// Requests answered from the cache without a remote fetch.
///
/// Labels: `kind`.
pub const CACHE_HITS_TOTAL: &str = "vault_cache_hits_total";

/// Requests that missed the lock-free lookup (including forced refetches).
///
/// Labels: `kind`.
pub const CACHE_MISSES_TOTAL: &str = "vault_cache_misses_total";

/// Remote fetches issued to the source.
///
/// Labels: `kind`, `status`.
pub const FETCHES_TOTAL: &str = "vault_cache_fetches_total";

/// Remote fetch duration in seconds.
///
/// Labels: `kind`.
pub const FETCH_DURATION_SECONDS: &str = "vault_cache_fetch_duration_seconds";

/// Lock waits that ran out of time.
///
/// Labels: `operation`.
pub const LOCK_TIMEOUTS_TOTAL: &str = "vault_cache_lock_timeouts_total";

/// Explicit removals (including those issued by `clear`).
pub const REMOVALS_TOTAL: &str = "vault_cache_removals_total";
