//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Order;

/// Environment variable that overrides `auth.access_key`.
pub const ACCESS_KEY_ENV: &str = "UNSPLASH_ACCESS_KEY";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API endpoint and HTTP client settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Download pipeline settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Credentials and OAuth flow settings
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            let mut config = Self::default();
            config.apply_env();
            config
        })
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(ACCESS_KEY_ENV) {
            if !key.trim().is_empty() {
                self.auth.access_key = Some(key);
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::config("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::config("api.timeout_secs must be > 0"));
        }
        if let Some(per_page) = self.api.per_page {
            if !(1..=30).contains(&per_page) {
                return Err(AppError::config("api.per_page must be between 1 and 30"));
            }
        }
        self.api.base_url()?;
        if self.download.parallel == 0 {
            return Err(AppError::config("download.parallel must be > 0"));
        }
        Ok(())
    }
}

/// API endpoint and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root of the REST API; endpoint paths are joined onto it
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Value of the `Accept-Version` header
    #[serde(default = "defaults::api_version")]
    pub api_version: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Page size sent as `per_page`; the API default applies when unset
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl ApiConfig {
    /// Parsed base URL, always ending with a slash so paths join beneath it.
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            api_version: defaults::api_version(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            per_page: None,
        }
    }
}

/// Download pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Target directory; a platform default is used when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Number of concurrent download workers
    #[serde(default = "defaults::parallel")]
    pub parallel: usize,

    /// Listing order
    #[serde(default)]
    pub order: Order,

    /// Maximum number of photos to download, negative for no limit
    #[serde(default = "defaults::limit")]
    pub limit: i64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: None,
            parallel: defaults::parallel(),
            order: Order::default(),
            limit: defaults::limit(),
        }
    }
}

/// Credentials and OAuth flow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Static access key sent as `Authorization: Client-ID <key>`
    #[serde(default)]
    pub access_key: Option<String>,

    /// OAuth application id
    #[serde(default)]
    pub client_id: String,

    /// OAuth application secret
    #[serde(default)]
    pub client_secret: String,

    /// Loopback address the redirect listener binds to
    #[serde(default = "defaults::redirect_bind")]
    pub redirect_bind: String,

    #[serde(default = "defaults::scopes")]
    pub scopes: Vec<String>,

    #[serde(default = "defaults::authorize_url")]
    pub authorize_url: String,

    #[serde(default = "defaults::token_url")]
    pub token_url: String,

    /// Where the OAuth token is persisted between runs
    #[serde(default = "defaults::token_file")]
    pub token_file: PathBuf,
}

impl AuthConfig {
    /// Redirect URI registered with the OAuth application.
    pub fn redirect_uri(&self) -> String {
        format!("http://{}", self.redirect_bind)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_key: None,
            client_id: String::new(),
            client_secret: String::new(),
            redirect_bind: defaults::redirect_bind(),
            scopes: defaults::scopes(),
            authorize_url: defaults::authorize_url(),
            token_url: defaults::token_url(),
            token_file: defaults::token_file(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // API defaults
    pub fn base_url() -> String {
        "https://api.unsplash.com/".into()
    }
    pub fn api_version() -> String {
        "v1".into()
    }
    pub fn user_agent() -> String {
        concat!("unsplash-dl/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Download defaults
    pub fn parallel() -> usize {
        4
    }
    pub fn limit() -> i64 {
        -1
    }

    // Auth defaults
    pub fn redirect_bind() -> String {
        "localhost:9900".into()
    }
    pub fn scopes() -> Vec<String> {
        vec![
            "public".into(),
            "read_photos".into(),
            "read_collections".into(),
        ]
    }
    pub fn authorize_url() -> String {
        "https://unsplash.com/oauth/authorize".into()
    }
    pub fn token_url() -> String {
        "https://unsplash.com/oauth/token".into()
    }
    pub fn token_file() -> PathBuf {
        PathBuf::from("token.json")
    }
}
