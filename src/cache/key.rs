use reqwest::Method;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// Identity of a cached response: method plus normalized URL.
///
/// Credentials are not part of the key; a run only ever uses one token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(method: &Method, url: &str) -> Result<Self, url::ParseError> {
        Ok(Self(format!("{} {}", method.as_str(), normalize_url(url)?)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex SHA-256 of the key, safe to use as a file name.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.0.as_bytes()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical form of a URL for cache lookups.
///
/// Scheme and host are lowercased and default ports dropped (both by the
/// parser), the fragment is removed and query pairs are sorted.
pub fn normalize_url(raw: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(raw)?;
    url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        pairs.sort();
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    Ok(url.into())
}

/// Only successful GET and POST responses are stored.
pub fn is_cacheable(method: &Method, status: u16) -> bool {
    (*method == Method::GET || *method == Method::POST) && status == 200
}
