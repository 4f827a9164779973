//! GitHub API module.
//!
//! Client, response types and the two endpoints the pipeline reads:
//! the starred listing and per-repository latest release.

mod client;
mod release;
mod starred;
mod types;

pub use client::{GitHubClient, GITHUB_ACCEPT, GITHUB_API_VERSION};
pub use release::{fetch_latest, parse_release, releases_latest_url, DataError};
pub use starred::Paginator;
pub use types::{ReleasePayload, ReleaseRecord, RepoRef};
