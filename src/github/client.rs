use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT},
    Client,
};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::config::ConfigError;
use crate::http::{
    read_limited_text, ApiResponse, FetchError, RateLimiter, Transport, MAX_RESPONSE_SIZE,
};

pub const GITHUB_API_VERSION: &str = "2022-11-28";
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";

const USER_AGENT_VALUE: &str = concat!("starfeed/", env!("CARGO_PKG_VERSION"));

/// Authenticated client for the GitHub API.
///
/// Every request waits on the shared [`RateLimiter`] before it is sent, and
/// the whole exchange (connect, headers, body) is bounded by `timeout`.
/// Non-2xx statuses are returned as responses, not errors; callers decide
/// what a 404 means.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    limiter: RateLimiter,
    timeout: Duration,
}

impl GitHubClient {
    pub fn new(
        token: &SecretString,
        limiter: RateLimiter,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| ConfigError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            limiter,
            timeout,
        })
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    async fn send(&self, url: &str) -> Result<ApiResponse, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status().as_u16();
        let link = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = read_limited_text(response, MAX_RESPONSE_SIZE).await?;

        Ok(ApiResponse {
            url: url.to_string(),
            status,
            body,
            link,
        })
    }
}

impl Transport for GitHubClient {
    async fn get(&self, url: &str) -> Result<ApiResponse, FetchError> {
        self.limiter.acquire().await;
        tracing::debug!(url = %url, "GET");

        let response = tokio::time::timeout(self.timeout, self.send(url))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout.as_secs()))??;

        tracing::debug!(url = %url, status = response.status, "Response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_token_with_newline() {
        let token = SecretString::from("abc\ndef".to_string());
        let limiter = RateLimiter::new(10.0).unwrap();
        assert!(matches!(
            GitHubClient::new(&token, limiter, Duration::from_secs(5)),
            Err(ConfigError::InvalidToken)
        ));
    }

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT_VALUE.starts_with("starfeed/"));
        assert!(USER_AGENT_VALUE.len() > "starfeed/".len());
    }
}
