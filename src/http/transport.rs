use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::future::Future;
use thiserror::Error;
use url::Url;

use super::link::next_link;

/// Upper bound for a single response body.
pub const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors raised while talking to the upstream API.
///
/// During pagination any of these aborts the run. During release lookups
/// they are scoped to the one repository being fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, body read)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// The exchange did not finish within the per-call timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    /// Non-2xx response where a success was required
    #[error("HTTP error: status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    /// Response body exceeded [`MAX_RESPONSE_SIZE`]
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Body was not the JSON shape the endpoint promises
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    /// A `next` link pointed back at a page that was already fetched
    #[error("Pagination cycle: {0} was already visited")]
    PaginationCycle(String),
}

/// A fully read upstream response.
///
/// Only the parts the pipeline needs are kept, which is also exactly what
/// the cache persists: status, body and the `Link` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// URL the request was made to (base for relative links).
    pub url: String,
    pub status: u16,
    pub body: String,
    /// Raw `Link` header, if the server sent one.
    pub link: Option<String>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// 5xx and 429 mean the upstream could not answer; anything else is an answer.
    pub fn is_upstream_failure(&self) -> bool {
        self.status >= 500 || self.status == 429
    }

    /// Turns a non-2xx response into [`FetchError::HttpStatus`].
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::HttpStatus {
                status: self.status,
                url: self.url,
            })
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_str(&self.body).map_err(|source| FetchError::Decode {
            url: self.url.clone(),
            source,
        })
    }

    /// Target of the `rel="next"` link, resolved against the request URL.
    pub fn next_page(&self) -> Result<Option<Url>, FetchError> {
        let Some(link) = self.link.as_deref() else {
            return Ok(None);
        };
        let base = Url::parse(&self.url)?;
        Ok(next_link(link, &base)?)
    }
}

/// Anything that can perform a GET against the API.
///
/// Implementations must be shareable across the concurrent release
/// lookups, hence `Send + Sync` and a `Send` future.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> impl Future<Output = Result<ApiResponse, FetchError>> + Send;
}

/// Reads a response body as UTF-8, refusing anything above `limit` bytes.
pub async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| FetchError::InvalidUtf8)
}
