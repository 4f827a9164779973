use futures::future::join_all;
use std::collections::HashSet;

use crate::github::{fetch_latest, ReleaseRecord, RepoRef};
use crate::http::Transport;

/// Looks up the latest release of every repository concurrently.
///
/// All lookups run at once, throttled only by whatever limiter sits in
/// `transport`. A failed lookup is logged and drops that repository; it
/// never cancels the others. Records come back in `repos` order, one per
/// `full_name`.
pub async fn collect<T: Transport>(transport: &T, repos: &[RepoRef]) -> Vec<ReleaseRecord> {
    let outcomes = join_all(repos.iter().map(|repo| async move {
        match fetch_latest(transport, repo).await {
            Ok(record) => Outcome::from(record),
            Err(e) => {
                tracing::warn!(repo = %repo.full_name, error = %e, "Release lookup failed");
                Outcome::Failed
            }
        }
    }))
    .await;

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(outcomes.len());
    let (mut without_release, mut failed) = (0usize, 0usize);

    for outcome in outcomes {
        match outcome {
            Outcome::Release(record) => {
                if seen.insert(record.full_name.clone()) {
                    records.push(record);
                }
            }
            Outcome::NoRelease => without_release += 1,
            Outcome::Failed => failed += 1,
        }
    }

    tracing::info!(
        repositories = repos.len(),
        records = records.len(),
        without_release,
        failed,
        "Collected releases"
    );
    records
}

enum Outcome {
    Release(ReleaseRecord),
    NoRelease,
    Failed,
}

impl From<Option<ReleaseRecord>> for Outcome {
    fn from(record: Option<ReleaseRecord>) -> Self {
        record.map_or(Outcome::NoRelease, Outcome::Release)
    }
}
