//! End-to-end run: pre-flight checks, starred listing, release fan-out.
//!
//! The limiter and cache are built here and injected into the transport
//! stack, so every outbound call in a run shares one of each:
//!
//! ```text
//! CachedTransport ─► GitHubClient ─► RateLimiter
//! ```
//!
//! Cache hits never reach the client and so never take a token.

use secrecy::SecretString;
use thiserror::Error;

use crate::cache::{CacheError, CacheStore, CachedTransport, DiskStore, MemoryStore};
use crate::config::{Config, ConfigError};
use crate::feed;
use crate::github::{GitHubClient, Paginator, ReleaseRecord};
use crate::http::{FetchError, RateLimiter, Transport};

/// Why a run produced no records.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to list starred repositories: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to open response cache: {0}")]
    Cache(#[from] CacheError),
}

/// Runs the whole pipeline against the configured API.
///
/// `token` is checked before anything else: without one, no request is
/// made. Listing failures abort the run; per-repository failures only
/// shrink the result.
pub async fn run(
    config: &Config,
    token: Option<SecretString>,
) -> Result<Vec<ReleaseRecord>, RunError> {
    let token = token.ok_or(ConfigError::MissingToken)?;
    config.validate()?;

    let limiter = RateLimiter::new(config.rate_limit).map_err(ConfigError::from)?;
    let client = GitHubClient::new(&token, limiter, config.request_timeout())?;

    if config.cache_enabled {
        let dir = config.resolved_cache_dir()?;
        let store = DiskStore::open(&dir)?;
        tracing::debug!(dir = %dir.display(), "Using on-disk response cache");
        run_with_store(client, store, config).await
    } else {
        tracing::debug!("On-disk cache disabled, caching for this run only");
        run_with_store(client, MemoryStore::default(), config).await
    }
}

async fn run_with_store<S: CacheStore>(
    client: GitHubClient,
    store: S,
    config: &Config,
) -> Result<Vec<ReleaseRecord>, RunError> {
    let transport = CachedTransport::new(client, store, config.cache_ttl());
    Ok(collect_releases(&transport, config).await?)
}

/// Lists the starred repositories, then looks up each one's latest release.
pub async fn collect_releases<T: Transport>(
    transport: &T,
    config: &Config,
) -> Result<Vec<ReleaseRecord>, FetchError> {
    let repos = Paginator::starred(transport, &config.api_base_url, config.per_page)?
        .list_all()
        .await?;
    Ok(feed::collect(transport, &repos).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_fails_first() {
        // Invalid config too: the token check must come first
        let config = Config {
            rate_limit: -1.0,
            ..Config::default()
        };
        let err = run(&config, None).await.unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::MissingToken)));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_requests() {
        let config = Config {
            rate_limit: 0.0,
            api_base_url: "http://127.0.0.1:1".to_string(),
            ..Config::default()
        };
        let err = run(&config, Some(SecretString::from("t".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RunError::Config(ConfigError::InvalidRateLimit(_))
        ));
    }
}
