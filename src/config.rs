//! Configuration types for comic-dl

use crate::error::{Error, Result};
use crate::types::{ExistingPolicy, Strategy};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Where item metadata and pages come from
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the metadata source (default: "https://xkcd.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (default: 30 seconds)
    ///
    /// Bounds every fetch so a stalled connection cannot park a worker forever.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Download behavior configuration (directory, concurrency, extraction)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Asset directory (default: "./comics")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Number of batch workers (default: 4)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Extraction strategy (default: structured)
    #[serde(default)]
    pub strategy: Strategy,

    /// Batch behavior on reaching an already stored item (default: stop_on_existing)
    #[serde(default)]
    pub existing_policy: ExistingPolicy,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_concurrent_downloads: default_max_concurrent(),
            strategy: Strategy::default(),
            existing_policy: ExistingPolicy::default(),
        }
    }
}

/// Retry configuration for transient transport failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6789)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for ComicDownloader
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Metadata source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Transport retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// HTTP API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Reject settings that would make startup meaningless
    ///
    /// Called before any directory is created or worker started; every error is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent_downloads == 0 {
            return Err(Error::config(
                "max_concurrent_downloads",
                "worker count must be at least 1",
            ));
        }

        if self.download.download_dir.as_os_str().is_empty() {
            return Err(Error::config("download_dir", "download directory is empty"));
        }

        let url = url::Url::parse(&self.source.base_url).map_err(|e| {
            Error::config("base_url", format!("{}: {}", self.source.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(
                "base_url",
                format!("unsupported scheme {:?}", url.scheme()),
            ));
        }

        if self.source.request_timeout.is_zero() {
            return Err(Error::config("request_timeout", "timeout must be non-zero"));
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    "https://xkcd.com".into()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("comic-dl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("comics")
}

fn default_max_concurrent() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6789))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
