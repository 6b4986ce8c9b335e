//! Caching engine.
//!
//! Three parts, owned together by the coordinator:
//!
//! - [`TtlStore`] — key → artifact map with a cache-wide time-to-live.
//!   Expired entries read as absent.
//!
//! - [`KeyLocks`] — one async mutex per key name, acquired with a bounded
//!   wait. Serialises fetches, refetches and removals of the same key while
//!   leaving different keys fully independent.
//!
//! - [`FetchCoordinator`] — the read-through logic: lock-free cache hits,
//!   double-checked population under the key lock, forced refetch, removal
//!   and clearing.

pub mod coordinator;
pub mod locks;
pub mod store;

pub use coordinator::FetchCoordinator;
pub use locks::{KeyLockGuard, KeyLocks};
pub use store::{CacheEntry, TtlStore};
