//! HTTP fetcher implementation
//!
//! This module handles every HTTP request the harvester makes:
//! - Building the HTTP client with the fixed header set and timeout
//! - Single-page GETs with bounded retry on rate limiting
//! - Classification of failures into rate-limit, status and network errors

use crate::config::{Config, FetchConfig, UserAgentConfig};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Terminal outcome of a page fetch that did not produce a body
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limited on {url} after {attempts} attempts")]
    RateLimitExhausted { url: String, attempts: u32 },

    #[error("HTTP {status} for {url}")]
    FatalStatus { url: String, status: u16 },

    #[error("network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// The URL whose fetch failed
    pub fn url(&self) -> &str {
        match self {
            Self::RateLimitExhausted { url, .. }
            | Self::FatalStatus { url, .. }
            | Self::Network { url, .. } => url,
        }
    }
}

/// Retry behavior for a single page fetch
///
/// Rate-limit responses are always retried. Transport failures and 5xx
/// responses are retried only when their flag is set.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_retries: u32,

    /// Unit the jittered exponential backoff is scaled from
    pub backoff_base: Duration,

    /// Jitter multiplier range, `[jitter_min, jitter_max)`
    pub jitter_min: f64,
    pub jitter_max: f64,

    pub retry_network_errors: bool,
    pub retry_server_errors: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: config.backoff_base(),
            jitter_min: config.backoff_jitter_min,
            jitter_max: config.backoff_jitter_max,
            retry_network_errors: config.retry_network_errors,
            retry_server_errors: config.retry_server_errors,
        }
    }

    /// Wait before retrying after the 0-based `attempt`
    ///
    /// `base × uniform(jitter_min, jitter_max) × 2^attempt`; with the default
    /// one-second base this lies in `[2^attempt, 3·2^attempt)` seconds.
    ///
    /// An inverted or empty jitter range collapses to its lower bound, and
    /// negative bounds count as zero.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let low = self.jitter_min.max(0.0);
        let high = self.jitter_max.max(0.0);
        let jitter = if low < high {
            rand::rng().random_range(low..high)
        } else {
            low
        };

        let exponent = attempt.min(30) as i32;
        let secs = self.backoff_base.as_secs_f64() * jitter * 2f64.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// What a single HTTP attempt produced
enum Attempt {
    Body(String),
    Status(StatusCode),
    Transport(reqwest::Error),
}

/// Builds an HTTP client with the fixed header set and timeout
///
/// # Example
///
/// ```no_run
/// use reel_harvest::config::{FetchConfig, UserAgentConfig};
/// use reel_harvest::crawler::build_http_client;
///
/// let agent = UserAgentConfig {
///     crawler_name: "ReelHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&agent, &FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    agent: &UserAgentConfig,
    fetch: &FetchConfig,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    Client::builder()
        .user_agent(format_user_agent(agent))
        .default_headers(headers)
        .timeout(fetch.timeout())
        .connect_timeout(fetch.timeout().min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Format: CrawlerName/Version (+ContactURL; ContactEmail)
pub fn format_user_agent(agent: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        agent.crawler_name, agent.crawler_version, agent.contact_url, agent.contact_email
    )
}

/// Single-page GET with bounded, jittered backoff
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 200 | Return body |
/// | HTTP 429 | Back off, retry up to `max_retries` attempts |
/// | HTTP 5xx | Fatal, unless `retry_server_errors` |
/// | Other status | Fatal immediately |
/// | Timeout / connect / body error | Fatal, unless `retry_network_errors` |
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl PageFetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Builds the client and policy from the harvest configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, &config.fetch)?;
        Ok(Self::new(client, RetryPolicy::from_config(&config.fetch)))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url`, returning the HTML body of a 200 response
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let max_attempts = self.policy.max_retries.max(1);
        let mut attempt = 0;

        loop {
            let last_attempt = attempt + 1 >= max_attempts;

            match self.attempt(url).await {
                Attempt::Body(body) => {
                    tracing::debug!("Fetched {} (attempt {})", url, attempt + 1);
                    return Ok(body);
                }

                Attempt::Status(status) if status == StatusCode::TOO_MANY_REQUESTS => {
                    if last_attempt {
                        tracing::warn!("Max retries reached for {}, skipping", url);
                        return Err(FetchError::RateLimitExhausted {
                            url: url.to_string(),
                            attempts: attempt + 1,
                        });
                    }
                    tracing::info!("Rate limited on {}, backing off", url);
                }

                Attempt::Status(status)
                    if status.is_server_error()
                        && self.policy.retry_server_errors
                        && !last_attempt =>
                {
                    tracing::info!("Server error {} on {}, backing off", status, url);
                }

                Attempt::Status(status) => {
                    tracing::warn!("Failed to fetch {}: HTTP {}", url, status.as_u16());
                    return Err(FetchError::FatalStatus {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }

                Attempt::Transport(source) => {
                    if !self.policy.retry_network_errors || last_attempt {
                        tracing::warn!("Error fetching {}: {}", url, source);
                        return Err(FetchError::Network {
                            url: url.to_string(),
                            source,
                        });
                    }
                    tracing::info!("Transport error on {}: {}, backing off", url, source);
                }
            }

            let wait = self.policy.backoff_delay(attempt);
            tracing::debug!(
                "Waiting {:.2}s before attempt {} of {}",
                wait.as_secs_f64(),
                attempt + 2,
                max_attempts
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, url: &str) -> Attempt {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Transport(e),
        };

        let status = response.status();
        tracing::debug!("Fetching {} - status {}", url, status.as_u16());

        if status != StatusCode::OK {
            return Attempt::Status(status);
        }

        match response.text().await {
            Ok(body) => Attempt::Body(body),
            Err(e) => Attempt::Transport(e),
        }
    }
}
