use serde::{Deserialize, Serialize};

/// One entry of the starred listing.
///
/// `full_name` (`owner/repo`) identifies the repository for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub name: String,
    pub full_name: String,
    /// API root of the repository (the listing's `url` field).
    #[serde(rename = "url")]
    pub api_url: String,
}

/// Raw `releases/latest` payload. Fields are optional here so a missing
/// one can be reported by name instead of as a generic decode error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleasePayload {
    pub name: Option<String>,
    pub html_url: Option<String>,
    pub tag_name: Option<String>,
}

/// The latest release of a starred repository, ready for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseRecord {
    pub full_name: String,
    /// Release name, or `full_name` when the release has none.
    pub display_name: String,
    pub html_url: String,
    pub tag: String,
    pub feed_url: String,
}

impl ReleaseRecord {
    /// Atom feed of a repository's releases.
    pub fn feed_url_for(full_name: &str) -> String {
        format!("https://github.com/{full_name}/releases.atom")
    }
}
