use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Reel-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host every listing URL is built from
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Page fetch and retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Maximum number of attempts for a single page
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Base unit of the exponential backoff (milliseconds)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Lower bound of the backoff jitter multiplier (inclusive)
    #[serde(rename = "backoff-jitter-min", default = "default_jitter_min")]
    pub backoff_jitter_min: f64,

    /// Upper bound of the backoff jitter multiplier (exclusive)
    #[serde(rename = "backoff-jitter-max", default = "default_jitter_max")]
    pub backoff_jitter_max: f64,

    /// Retry transport failures with the rate-limit backoff
    #[serde(rename = "retry-network-errors", default)]
    pub retry_network_errors: bool,

    /// Retry HTTP 5xx responses with the rate-limit backoff
    #[serde(rename = "retry-server-errors", default)]
    pub retry_server_errors: bool,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_jitter_min: default_jitter_min(),
            backoff_jitter_max: default_jitter_max(),
            retry_network_errors: false,
            retry_server_errors: false,
        }
    }
}

/// Batching and politeness budget
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Number of users crawled concurrently in one batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause after every batch (milliseconds)
    #[serde(rename = "cooldown-ms", default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Lower bound of the per-user courtesy delay (milliseconds)
    #[serde(rename = "courtesy-delay-min-ms", default = "default_courtesy_min_ms")]
    pub courtesy_delay_min_ms: u64,

    /// Upper bound of the per-user courtesy delay (milliseconds)
    #[serde(rename = "courtesy-delay-max-ms", default = "default_courtesy_max_ms")]
    pub courtesy_delay_max_ms: u64,

    /// Maximum number of listing pages in flight for one user
    #[serde(rename = "max-concurrent-pages", default = "default_max_concurrent_pages")]
    pub max_concurrent_pages: usize,
}

impl ScheduleConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            cooldown_ms: default_cooldown_ms(),
            courtesy_delay_min_ms: default_courtesy_min_ms(),
            courtesy_delay_max_ms: default_courtesy_max_ms(),
            max_concurrent_pages: default_max_concurrent_pages(),
        }
    }
}

/// Popular-member discovery
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Number of unique usernames to collect
    #[serde(rename = "target-users", default = "default_target_users")]
    pub target_users: usize,

    /// Hard stop on the number of listing pages visited
    #[serde(rename = "max-pages", default = "default_discovery_max_pages")]
    pub max_pages: u32,

    /// Where the discovered usernames are written
    #[serde(rename = "users-path", default = "default_users_path")]
    pub users_path: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            target_users: default_target_users(),
            max_pages: default_discovery_max_pages(),
            users_path: default_users_path(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding one CSV per user
    #[serde(rename = "data-dir", default = "default_data_dir")]
    pub data_dir: String,

    /// Path of the merged, username-tagged CSV
    #[serde(rename = "aggregate-path", default = "default_aggregate_path")]
    pub aggregate_path: String,

    /// Path of the CSV listing users whose datasets were empty
    #[serde(rename = "skipped-path", default = "default_skipped_path")]
    pub skipped_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            aggregate_path: default_aggregate_path(),
            skipped_path: default_skipped_path(),
        }
    }
}

fn default_origin() -> String {
    "https://letterboxd.com".to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_jitter_min() -> f64 {
    1.0
}

fn default_jitter_max() -> f64 {
    3.0
}

fn default_batch_size() -> usize {
    4
}

fn default_cooldown_ms() -> u64 {
    3000
}

fn default_courtesy_min_ms() -> u64 {
    3000
}

fn default_courtesy_max_ms() -> u64 {
    5000
}

fn default_max_concurrent_pages() -> usize {
    4
}

fn default_target_users() -> usize {
    2500
}

fn default_discovery_max_pages() -> u32 {
    256
}

fn default_users_path() -> String {
    "users.csv".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_aggregate_path() -> String {
    "combined.csv".to_string()
}

fn default_skipped_path() -> String {
    "skipped_users.csv".to_string()
}
