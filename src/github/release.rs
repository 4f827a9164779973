use thiserror::Error;

use super::types::{ReleasePayload, ReleaseRecord, RepoRef};
use crate::http::{ApiResponse, FetchError, Transport};

/// A release payload that cannot become a [`ReleaseRecord`].
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Release payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Release payload has no `{0}`")]
    MissingField(&'static str),
}

pub fn releases_latest_url(repo: &RepoRef) -> String {
    format!("{}/releases/latest", repo.api_url.trim_end_matches('/'))
}

/// Fetches the latest release of `repo`.
///
/// - `Ok(Some(_))` - the repository has a usable release
/// - `Ok(None)` - no release (404), or a payload missing required fields
/// - `Err(_)` - the lookup itself failed (network, timeout, other status)
///
/// Bad payloads are logged here, so callers only see fetch failures.
pub async fn fetch_latest<T: Transport>(
    transport: &T,
    repo: &RepoRef,
) -> Result<Option<ReleaseRecord>, FetchError> {
    let response = transport.get(&releases_latest_url(repo)).await?;

    if response.is_not_found() {
        tracing::debug!(repo = %repo.full_name, "No release");
        return Ok(None);
    }
    let response = response.error_for_status()?;

    match parse_release(repo, &response) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            tracing::warn!(repo = %repo.full_name, error = %e, "Skipping unusable release");
            Ok(None)
        }
    }
}

/// Builds a record from a `releases/latest` body.
///
/// A missing, null or empty `name` falls back to the repository's
/// `full_name`; `html_url` and `tag_name` are required.
pub fn parse_release(repo: &RepoRef, response: &ApiResponse) -> Result<ReleaseRecord, DataError> {
    let payload: ReleasePayload = serde_json::from_str(&response.body)?;

    let html_url = payload
        .html_url
        .filter(|s| !s.is_empty())
        .ok_or(DataError::MissingField("html_url"))?;
    let tag = payload
        .tag_name
        .filter(|s| !s.is_empty())
        .ok_or(DataError::MissingField("tag_name"))?;
    let display_name = payload
        .name
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| repo.full_name.clone());

    Ok(ReleaseRecord {
        full_name: repo.full_name.clone(),
        display_name,
        html_url,
        tag,
        feed_url: ReleaseRecord::feed_url_for(&repo.full_name),
    })
}
