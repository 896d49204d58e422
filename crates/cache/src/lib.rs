//! Cacheable repository for tether
//!
//! This crate combines a freshness policy, a cache store and a remote fetch
//! into two retrieval strategies:
//! - Cache-first: serve a fresh entry, fetch only on a miss
//! - Network-first: fetch first, fall back to any stored entry on failure
//!
//! Remote fetches can be wrapped in the retry and circuit breaker primitives
//! from `tether-utils`.

pub mod config;
pub mod entry;
pub mod fetch;
pub mod repository;
pub mod store;

pub use config::{
    ConfigSource, RepositoryConfig, RepositoryConfigBuilder, RepositoryConfigLoader,
    RepositoryConfiguration,
};
pub use entry::CacheEntry;
pub use fetch::{fallible, RemoteFetch};
pub use repository::CacheableRepository;
pub use store::{CacheStore, FileStore, MemoryStore};
