//! Response cache for API calls.
//!
//! [`CachedTransport`] decorates any [`Transport`](crate::http::Transport)
//! with a stale-while-error policy. Entries live in a [`CacheStore`]:
//!
//! - [`DiskStore`] - JSON files under the cache directory, reused across runs
//! - [`MemoryStore`] - bounded LRU, gone when the process exits
//!
//! Keys are built by [`CacheKey`] from the method and a normalized URL.

mod key;
mod layer;
mod store;

pub use key::{is_cacheable, normalize_url, CacheKey};
pub use layer::{CachedTransport, DEFAULT_TTL};
pub use store::{
    CacheEntry, CacheError, CacheStore, DiskStore, Freshness, MemoryStore,
    DEFAULT_MEMORY_CAPACITY,
};
