use super::CacheStore;
use crate::entry::CacheEntry;
use async_trait::async_trait;
use parking_lot::RwLock;
use tether_core::Result;

/// In-process store
#[derive(Debug)]
pub struct MemoryStore<T> {
    entry: RwLock<Option<CacheEntry<T>>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            entry: RwLock::new(None),
        }
    }

    /// Start with `entry` already stored
    pub fn with_entry(entry: CacheEntry<T>) -> Self {
        Self {
            entry: RwLock::new(Some(entry)),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> CacheStore<T> for MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self) -> Result<Option<CacheEntry<T>>> {
        Ok(self.entry.read().clone())
    }

    async fn set(&self, entry: CacheEntry<T>) -> Result<()> {
        *self.entry.write() = Some(entry);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entry.write().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_replaces_and_clear_empties() {
        let store = MemoryStore::new();
        assert_eq!(store.get().await.unwrap(), None);

        store.set(CacheEntry::new("first", 1)).await.unwrap();
        store.set(CacheEntry::new("second", 2)).await.unwrap();
        assert_eq!(
            store.get().await.unwrap(),
            Some(CacheEntry::new("second", 2))
        );

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);
    }
}
