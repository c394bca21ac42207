//! Local key-value cache
//!
//! Survives restarts and is scoped to the device. Holds the full progress
//! map under [`PROGRESS_KEY`]: the only store for guests, and a write-through
//! mirror of the remote store for signed-in users.

use crate::error::{StoreError, StoreResult};
use crate::record_store::write_atomic;
use async_trait::async_trait;
use dashmap::DashMap;
use roadmap_progress::ProgressMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

/// Key of the progress map
pub const PROGRESS_KEY: &str = "roadmap-progress";
/// Key of the target move date
pub const DEADLINE_KEY: &str = "roadmap-deadline";
/// Key of the last known session
pub const SESSION_KEY: &str = "roadmap-session";

/// Persistent string key-value store
#[async_trait]
pub trait LocalCache: Send + Sync + std::fmt::Debug {
    /// Value under `key`, if any
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace the value under `key`
    async fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Drop the value under `key`; missing keys are fine
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Read a JSON value from the cache
///
/// # Errors
/// Fails on backend errors or when the stored text isn't valid JSON for `T`.
pub async fn load_json<T: DeserializeOwned>(
    cache: &dyn LocalCache,
    key: &str,
) -> StoreResult<Option<T>> {
    match cache.get(key).await? {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Write a JSON value to the cache
///
/// # Errors
/// Fails on backend or encoding errors.
pub async fn store_json<T: Serialize + Sync>(
    cache: &dyn LocalCache,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let text = serde_json::to_string(value)?;
    cache.put(key, &text).await
}

/// Cached progress map, empty when nothing was cached yet
///
/// # Errors
/// See [`load_json`].
pub async fn load_progress(cache: &dyn LocalCache) -> StoreResult<ProgressMap> {
    Ok(load_json(cache, PROGRESS_KEY).await?.unwrap_or_default())
}

/// Replace the cached progress map
///
/// # Errors
/// See [`store_json`].
pub async fn save_progress(cache: &dyn LocalCache, progress: &ProgressMap) -> StoreResult<()> {
    store_json(cache, PROGRESS_KEY, progress).await
}

/// In-process cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, String>,
}

impl MemoryCache {
    /// Empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalCache for MemoryCache {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory-backed cache, one file per key
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Cache rooted at `root`; the directory is created on first write
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl LocalCache for FileCache {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match tokio::fs::read_to_string(self.path(key)?).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path(key)?;
        tokio::fs::create_dir_all(&self.root).await?;
        write_atomic(&path, value.as_bytes()).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        match tokio::fs::remove_file(self.path(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
