//! Turn a GitHub user's starred repositories into release feeds.
//!
//! [`run`] lists the starred repositories, looks up each one's latest
//! release concurrently behind a shared rate limiter and response cache,
//! and returns one [`ReleaseRecord`](github::ReleaseRecord) per repository
//! that has a release. The [`feed`] exporters turn those records into an
//! osmosfeed source list or an OPML document.

pub mod cache;
pub mod config;
pub mod feed;
pub mod github;
pub mod http;
pub mod pipeline;
pub mod util;

pub use pipeline::{collect_releases, run, RunError};
