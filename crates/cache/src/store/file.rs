//! JSON file store
//!
//! The entry is serialized to a single JSON document. Writes go through
//! [`write_atomic`], so readers never see a half-written file.

use super::CacheStore;
use crate::entry::CacheEntry;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tether_core::{Failure, Result};
use tether_utils::{storage_failure, write_atomic};
use tokio::sync::Mutex;

/// Store persisting the entry as JSON at a fixed path
#[derive(Debug)]
pub struct FileStore<T> {
    path: PathBuf,
    // Serializes writers so the last `set` to start is the last to land
    write_lock: Mutex<()>,
    _entry: PhantomData<fn() -> T>,
}

impl<T> FileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _entry: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl<T> CacheStore<T> for FileStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self) -> Result<Option<CacheEntry<T>>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_failure(&self.path, "read cache entry", e)),
        };

        let entry = serde_json::from_slice(&bytes).map_err(|e| {
            Failure::cache_error(format!(
                "decode cache entry at {}: {e}",
                self.path.display()
            ))
        })?;
        Ok(Some(entry))
    }

    async fn set(&self, entry: CacheEntry<T>) -> Result<()> {
        let bytes = serde_json::to_vec(&entry)
            .map_err(|e| Failure::cache_error(format!("encode cache entry: {e}")))?;
        let path = self.path.clone();

        let _guard = self.write_lock.lock().await;
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes)).await?
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_failure(&self.path, "remove cache entry", e)),
        }
    }
}
