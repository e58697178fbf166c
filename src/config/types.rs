use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for ptt-harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(rename = "board", default)]
    pub boards: Vec<BoardEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Site root that listing and article URLs are built from
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Delay after each listing page in range and batch modes (milliseconds)
    #[serde(rename = "page-delay", default = "default_page_delay")]
    pub page_delay: u64,

    /// Pause between polling cycles in latest-page mode (seconds)
    #[serde(rename = "poll-interval", default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Cookie sent with every request to pass the age gate
    #[serde(rename = "age-cookie", default = "default_age_cookie")]
    pub age_cookie: String,
}

impl CrawlerConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_delay: default_page_delay(),
            poll_interval: default_poll_interval(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            age_cookie: default_age_cookie(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Log destination
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log file; logs go to stderr when unset
    pub file: Option<String>,

    /// Append to an existing log file instead of truncating it
    #[serde(default = "default_append")]
    pub append: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            append: default_append(),
        }
    }
}

/// A board to harvest, with an optional page range for range/batch modes
#[derive(Debug, Clone, Deserialize)]
pub struct BoardEntry {
    pub name: String,

    #[serde(rename = "start-page")]
    pub start_page: Option<u32>,

    #[serde(rename = "end-page")]
    pub end_page: Option<u32>,
}

impl BoardEntry {
    /// Returns the configured `(start, end)` range, if both ends are set
    pub fn range(&self) -> Option<(u32, u32)> {
        self.start_page.zip(self.end_page)
    }
}

fn default_base_url() -> String {
    "https://www.ptt.cc".to_string()
}

fn default_page_delay() -> u64 {
    1000
}

fn default_poll_interval() -> u64 {
    120
}

fn default_request_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_age_cookie() -> String {
    "over18=1".to_string()
}

fn default_append() -> bool {
    true
}
