//! Storage backends holding the single entry of a repository

use crate::entry::CacheEntry;
use async_trait::async_trait;
use std::sync::Arc;
use tether_core::Result;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Minimal persistence contract used by the repository.
///
/// `set` must replace the entry as a whole: a concurrent `get` observes
/// either the previous entry or the new one, never a mix.
#[async_trait]
pub trait CacheStore<T: Send + 'static>: Send + Sync {
    /// Read the stored entry, if any
    async fn get(&self) -> Result<Option<CacheEntry<T>>>;

    /// Replace the stored entry
    async fn set(&self, entry: CacheEntry<T>) -> Result<()>;

    /// Remove the stored entry; clearing an empty store succeeds
    async fn clear(&self) -> Result<()>;
}

#[async_trait]
impl<T, S> CacheStore<T> for Arc<S>
where
    T: Send + 'static,
    S: CacheStore<T> + ?Sized,
{
    async fn get(&self) -> Result<Option<CacheEntry<T>>> {
        (**self).get().await
    }

    async fn set(&self, entry: CacheEntry<T>) -> Result<()> {
        (**self).set(entry).await
    }

    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }
}
