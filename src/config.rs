//! Configuration file parser for ~/.config/starfeed/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
//!
//! Values are checked by [`Config::validate`] before any request is made.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::http::{InvalidRate, RateLimiter};

/// Environment variable holding the GitHub token. Takes precedence over the
/// `github_token` config key.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Please set the GITHUB_TOKEN environment variable (or github_token in the config file)")]
    MissingToken,

    #[error("GitHub token contains characters that cannot be sent in a header")]
    InvalidToken,

    #[error(transparent)]
    InvalidRateLimit(#[from] InvalidRate),

    #[error("Invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    /// SEC-002: the token would travel in clear text.
    #[error("Insecure API base URL {0}: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl(String),

    #[error("No cache directory: set cache_dir or HOME")]
    NoCacheDir,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
///
/// SEC-015: Custom Debug impl masks `github_token` to prevent secret leakage
/// in logs, error messages, and debug output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Outbound requests per second, shared by every API call.
    pub rate_limit: f64,

    /// Minutes a cached response is served without asking GitHub.
    pub cache_ttl_minutes: u64,

    /// Persist responses across runs. When off, responses are only
    /// remembered for the current run.
    pub cache_enabled: bool,

    /// Where cached responses live. Defaults to ~/.cache/starfeed.
    pub cache_dir: Option<PathBuf>,

    /// Per-request timeout in seconds, covering connect and body read.
    pub request_timeout_secs: u64,

    /// Page size for the starred listing (GitHub caps it at 100).
    pub per_page: u32,

    /// REST API root. Only changed for GitHub Enterprise or tests.
    pub api_base_url: String,

    /// GitHub token (alternative to GITHUB_TOKEN env var).
    /// Env var takes precedence over config file.
    pub github_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rate_limit: 10.0,
            cache_ttl_minutes: 60,
            cache_enabled: true,
            cache_dir: None,
            request_timeout_secs: 60,
            per_page: 100,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            github_token: None,
        }
    }
}

/// SEC-015: Mask github_token in Debug output to prevent secret leakage.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("rate_limit", &self.rate_limit)
            .field("cache_ttl_minutes", &self.cache_ttl_minutes)
            .field("cache_enabled", &self.cache_enabled)
            .field("cache_dir", &self.cache_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("per_page", &self.per_page)
            .field("api_base_url", &self.api_base_url)
            .field(
                "github_token",
                &self.github_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "rate_limit",
        "cache_ttl_minutes",
        "cache_enabled",
        "cache_dir",
        "request_timeout_secs",
        "per_page",
        "api_base_url",
        "github_token",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    ///
    /// Loading does not validate values; call [`Config::validate`] after
    /// applying command-line overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        // from a maliciously large or corrupted config file.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            path = %path.display(),
            rate_limit = config.rate_limit,
            cache_enabled = config.cache_enabled,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        RateLimiter::new(self.rate_limit)?;

        if !(1..=100).contains(&self.per_page) {
            return Err(ConfigError::InvalidValue {
                key: "per_page",
                reason: format!("{} is outside 1..=100", self.per_page),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }

        let base = Url::parse(&self.api_base_url).map_err(|e| ConfigError::InvalidValue {
            key: "api_base_url",
            reason: e.to_string(),
        })?;

        // SEC-002: Enforce HTTPS for the API root to prevent token exposure
        // Allow HTTP only for localhost/127.0.0.1 (testing purposes)
        if base.scheme() != "https" {
            let is_localhost = base.scheme() == "http"
                && matches!(base.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));
            if !is_localhost {
                return Err(ConfigError::InsecureBaseUrl(self.api_base_url.clone()));
            }
            tracing::warn!(base_url = %self.api_base_url, "Using non-HTTPS API base URL (localhost only)");
        }

        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes.saturating_mul(60))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured cache directory, else ~/.cache/starfeed/http.
    pub fn resolved_cache_dir(&self) -> Result<PathBuf, ConfigError> {
        self.cache_dir
            .clone()
            .or_else(|| home_dir().map(|home| home.join(".cache").join("starfeed").join("http")))
            .ok_or(ConfigError::NoCacheDir)
    }

    /// The GitHub token from the environment, else from the config file.
    pub fn resolve_token(&self) -> Option<SecretString> {
        pick_token(std::env::var(TOKEN_ENV).ok(), self.github_token.as_deref())
    }
}

/// Default config file location (~/.config/starfeed/config.toml).
pub fn default_config_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".config").join("starfeed").join("config.toml"))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Blank values count as unset.
fn pick_token(env_value: Option<String>, file_value: Option<&str>) -> Option<SecretString> {
    env_value
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            file_value
                .filter(|t| !t.trim().is_empty())
                .map(str::to_string)
        })
        .map(|t| SecretString::from(t.trim().to_string()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.rate_limit, 10.0);
        assert_eq!(config.cache_ttl_minutes, 60);
        assert!(config.cache_enabled);
        assert!(config.cache_dir.is_none());
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.per_page, 100);
        assert_eq!(config.api_base_url, "https://api.github.com");
        assert!(config.github_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.rate_limit, 10.0);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let (_dir, path) = write_config("   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.per_page, 100);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let (_dir, path) = write_config("rate_limit = 2.5\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.rate_limit, 2.5);
        assert_eq!(config.cache_ttl_minutes, 60); // default
        assert!(config.cache_enabled); // default
    }

    #[test]
    fn test_full_config() {
        let (_dir, path) = write_config(
            r#"
rate_limit = 4
cache_ttl_minutes = 15
cache_enabled = false
cache_dir = "/var/cache/starfeed"
request_timeout_secs = 30
per_page = 50
api_base_url = "https://github.example.com/api/v3"
github_token = "ghp_from_file"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.rate_limit, 4.0);
        assert_eq!(config.cache_ttl(), Duration::from_secs(15 * 60));
        assert!(!config.cache_enabled);
        assert_eq!(
            config.resolved_cache_dir().unwrap(),
            PathBuf::from("/var/cache/starfeed")
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.per_page, 50);
        assert_eq!(config.api_base_url, "https://github.example.com/api/v3");
        assert_eq!(config.github_token.as_deref(), Some("ghp_from_file"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (_dir, path) = write_config("this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let (_dir, path) = write_config("per_page = \"lots\"\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let (_dir, path) = write_config("rate_limit = 3\ntotally_fake_key = true\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.rate_limit, 3.0);
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let (_dir, path) = write_config(&"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_rate_limit_must_be_positive() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e-30] {
            let config = Config {
                rate_limit: rate,
                ..Config::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidRateLimit(_))),
                "rate {rate} should be rejected"
            );
        }
    }

    #[test]
    fn test_per_page_bounds() {
        for per_page in [0, 101] {
            let config = Config {
                per_page,
                ..Config::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue { key: "per_page", .. })
            ));
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_base_url_rejected() {
        let config = Config {
            api_base_url: "http://api.example.com".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InsecureBaseUrl(_))
        ));
    }

    #[test]
    fn test_localhost_base_url_allowed() {
        let config = Config {
            api_base_url: "http://127.0.0.1:8080".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_garbage_base_url_rejected() {
        let config = Config {
            api_base_url: "::not a url::".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "api_base_url", .. })
        ));
    }

    #[test]
    fn test_env_token_wins_over_file() {
        let token = pick_token(Some("from-env".into()), Some("from-file")).unwrap();
        assert_eq!(token.expose_secret(), "from-env");
    }

    #[test]
    fn test_file_token_used_when_env_missing_or_blank() {
        let token = pick_token(None, Some("from-file")).unwrap();
        assert_eq!(token.expose_secret(), "from-file");

        let token = pick_token(Some("  ".into()), Some("from-file")).unwrap();
        assert_eq!(token.expose_secret(), "from-file");
    }

    #[test]
    fn test_no_token_anywhere() {
        assert!(pick_token(None, None).is_none());
        assert!(pick_token(Some(String::new()), Some("")).is_none());
    }

    // SEC-015: Debug output masks the token
    #[test]
    fn test_debug_masks_token() {
        let config = Config {
            github_token: Some("ghp_super_secret_12345".to_string()),
            ..Config::default()
        };

        let debug_output = format!("{:?}", config);
        assert!(
            !debug_output.contains("ghp_super_secret_12345"),
            "Debug output should not contain the token"
        );
        assert!(debug_output.contains("[REDACTED]"));
    }
}
