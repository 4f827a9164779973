use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

use super::key::CacheKey;
use crate::http::ApiResponse;
use crate::util::write_atomic;

/// Entries kept by [`MemoryStore::default`].
pub const DEFAULT_MEMORY_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt cache entry: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whether an entry may be served without asking upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// A stored upstream response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub url: String,
    pub status: u16,
    pub body: String,
    pub link: Option<String>,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: CacheKey, response: &ApiResponse) -> Self {
        Self {
            key,
            url: response.url.clone(),
            status: response.status,
            body: response.body.clone(),
            link: response.link.clone(),
            stored_at: Utc::now(),
        }
    }

    pub fn freshness(&self, ttl: Duration) -> Freshness {
        let age = Utc::now()
            .signed_duration_since(self.stored_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        if age < ttl {
            Freshness::Fresh
        } else {
            Freshness::Stale
        }
    }

    pub fn to_response(&self) -> ApiResponse {
        ApiResponse {
            url: self.url.clone(),
            status: self.status,
            body: self.body.clone(),
            link: self.link.clone(),
        }
    }
}

/// Storage behind the response cache.
///
/// Implementations synchronise internally: callers share one store across
/// concurrent requests without extra locking. Writing a key replaces the
/// previous entry for it. Both operations are awaited from request tasks,
/// so they must not block the runtime.
pub trait CacheStore: Send + Sync {
    fn load(
        &self,
        key: &CacheKey,
    ) -> impl Future<Output = Result<Option<CacheEntry>, CacheError>> + Send;
    fn save(&self, entry: &CacheEntry) -> impl Future<Output = Result<(), CacheError>> + Send;
}

/// Bounded in-process store; nothing survives the run.
pub struct MemoryStore {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
}

impl MemoryStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<CacheKey, CacheEntry>> {
        // Recover from poisoning
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_MEMORY_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl CacheStore for MemoryStore {
    async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn save(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        self.lock().put(entry.key.clone(), entry.clone());
        Ok(())
    }
}

/// One JSON file per key, named by the key's SHA-256.
///
/// Survives across runs. Writes go through a temp file and a rename, so a
/// concurrent reader never sees a torn entry and the last writer wins.
/// Reads use `tokio::fs`; the fsync-and-rename write runs on the blocking
/// pool.
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.digest()))
    }
}

impl CacheStore for DiskStore {
    async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let contents = match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = serde_json::from_str(&contents)?;
        // Digest collision or a hand-edited file
        if entry.key != *key {
            tracing::debug!(expected = %key, found = %entry.key, "Cache file holds a different key");
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn save(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let json = serde_json::to_vec(entry)?;
        let path = self.path_for(&entry.key);
        tokio::task::spawn_blocking(move || write_atomic(&path, &json))
            .await
            .map_err(std::io::Error::from)??;
        Ok(())
    }
}
