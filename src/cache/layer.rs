use reqwest::Method;
use std::time::Duration;

use super::key::{is_cacheable, CacheKey};
use super::store::{CacheEntry, CacheStore, Freshness};
use crate::http::{ApiResponse, FetchError, Transport};

/// Default freshness window for stored responses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Stale-tolerant response cache in front of another [`Transport`].
///
/// - A fresh entry is returned without touching `inner`.
/// - Otherwise `inner` is called. A 200 is stored before it is returned.
/// - If that call fails (transport error, 5xx or 429) and any entry exists
///   for the key, the entry is served regardless of age.
/// - With no entry the failure is passed through unchanged.
///
/// Store errors are logged and treated as misses.
pub struct CachedTransport<T, S> {
    inner: T,
    store: S,
    ttl: Duration,
}

impl<T: Transport, S: CacheStore> CachedTransport<T, S> {
    pub fn new(inner: T, store: S, ttl: Duration) -> Self {
        Self { inner, store, ttl }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.store.load(key).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    async fn remember(&self, key: CacheKey, response: &ApiResponse) {
        let entry = CacheEntry::new(key, response);
        if let Err(e) = self.store.save(&entry).await {
            tracing::warn!(key = %entry.key, error = %e, "Cache write failed");
        }
    }
}

impl<T: Transport, S: CacheStore> Transport for CachedTransport<T, S> {
    async fn get(&self, url: &str) -> Result<ApiResponse, FetchError> {
        let key = CacheKey::new(&Method::GET, url)?;
        let cached = self.lookup(&key).await;

        if let Some(entry) = &cached {
            if entry.freshness(self.ttl) == Freshness::Fresh {
                tracing::debug!(url = %url, "Cache hit");
                return Ok(entry.to_response());
            }
        }

        match self.inner.get(url).await {
            Ok(response) if is_cacheable(&Method::GET, response.status) => {
                self.remember(key, &response).await;
                Ok(response)
            }
            Ok(response) if response.is_upstream_failure() => match cached {
                Some(entry) => {
                    tracing::warn!(
                        url = %url,
                        status = response.status,
                        stored_at = %entry.stored_at,
                        "Upstream error, serving stale cached response"
                    );
                    Ok(entry.to_response())
                }
                None => Ok(response),
            },
            Ok(response) => Ok(response),
            Err(e) => match cached {
                Some(entry) => {
                    tracing::warn!(
                        url = %url,
                        error = %e,
                        stored_at = %entry.stored_at,
                        "Request failed, serving stale cached response"
                    );
                    Ok(entry.to_response())
                }
                None => Err(e),
            },
        }
    }
}
