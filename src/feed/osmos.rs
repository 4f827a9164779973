use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::github::ReleaseRecord;
use crate::util::write_atomic;

/// Default output file for `--osmos`.
pub const DEFAULT_OSMOS_FILE: &str = "osmosfeed.yaml";

/// osmosfeed source list: `sources: [{href: ...}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsmosConfig {
    pub sources: Vec<OsmosSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsmosSource {
    pub href: String,
}

impl From<&[ReleaseRecord]> for OsmosConfig {
    fn from(records: &[ReleaseRecord]) -> Self {
        Self {
            sources: records
                .iter()
                .map(|r| OsmosSource {
                    href: r.feed_url.clone(),
                })
                .collect(),
        }
    }
}

pub fn export_osmos(records: &[ReleaseRecord]) -> Result<String> {
    serde_yaml::to_string(&OsmosConfig::from(records)).context("Failed to serialize osmosfeed config")
}

/// Writes the osmosfeed config to `path`, replacing any existing file.
pub fn export_to_file(records: &[ReleaseRecord], path: &Path) -> Result<()> {
    let content = export_osmos(records)?;
    write_atomic(path, content.as_bytes())
        .with_context(|| format!("Failed to write osmosfeed config to '{}'", path.display()))?;
    tracing::info!(path = %path.display(), sources = records.len(), "Wrote osmosfeed config");
    Ok(())
}
