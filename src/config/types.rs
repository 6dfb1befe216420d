use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub webdriver: WebDriverConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

/// Retry ceilings and settle intervals for driving the calendar.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_navigation_attempts")]
    pub max_navigation_attempts: u32,
    #[serde(default = "default_navigation_settle_ms")]
    pub navigation_settle_ms: u64,
    #[serde(default = "default_max_quote_poll_attempts")]
    pub max_quote_poll_attempts: u32,
    #[serde(default = "default_quote_poll_interval_ms")]
    pub quote_poll_interval_ms: u64,
    #[serde(default = "default_checkout_click_delay_ms")]
    pub checkout_click_delay_ms: u64,
    #[serde(default = "default_clear_settle_ms")]
    pub clear_settle_ms: u64,
    #[serde(default = "default_probe_gap_ms")]
    pub probe_gap_ms: u64,
}

impl EngineConfig {
    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn quote_poll_interval(&self) -> Duration {
        Duration::from_millis(self.quote_poll_interval_ms)
    }

    pub fn checkout_click_delay(&self) -> Duration {
        Duration::from_millis(self.checkout_click_delay_ms)
    }

    pub fn clear_settle(&self) -> Duration {
        Duration::from_millis(self.clear_settle_ms)
    }

    pub fn probe_gap(&self) -> Duration {
        Duration::from_millis(self.probe_gap_ms)
    }

    /// Same retry ceilings, no waiting. Used by tests and dry runs.
    pub fn without_delays() -> Self {
        Self {
            navigation_settle_ms: 0,
            quote_poll_interval_ms: 0,
            checkout_click_delay_ms: 0,
            clear_settle_ms: 0,
            probe_gap_ms: 0,
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_navigation_attempts: default_max_navigation_attempts(),
            navigation_settle_ms: default_navigation_settle_ms(),
            max_quote_poll_attempts: default_max_quote_poll_attempts(),
            quote_poll_interval_ms: default_quote_poll_interval_ms(),
            checkout_click_delay_ms: default_checkout_click_delay_ms(),
            clear_settle_ms: default_clear_settle_ms(),
            probe_gap_ms: default_probe_gap_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    #[serde(default = "default_initial_render_wait_ms")]
    pub initial_render_wait_ms: u64,
    #[serde(default = "default_inter_item_delay_ms")]
    pub inter_item_delay_ms: u64,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            initial_render_wait_ms: default_initial_render_wait_ms(),
            inter_item_delay_ms: default_inter_item_delay_ms(),
            history_size: default_history_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebDriverConfig {
    #[serde(default = "default_webdriver_url")]
    pub url: String,
    #[serde(default = "default_webdriver_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: default_webdriver_url(),
            request_timeout_secs: default_webdriver_timeout(),
            headless: true,
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the price history API. Snapshots are not forwarded when unset.
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_backend_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            request_timeout_secs: default_backend_timeout(),
        }
    }
}

/// Results-page watcher. Off unless `watch` is set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub watch: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            watch: false,
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_max_navigation_attempts() -> u32 {
    12
}

fn default_navigation_settle_ms() -> u64 {
    1000
}

fn default_max_quote_poll_attempts() -> u32 {
    20
}

fn default_quote_poll_interval_ms() -> u64 {
    100
}

fn default_checkout_click_delay_ms() -> u64 {
    300
}

fn default_clear_settle_ms() -> u64 {
    1000
}

fn default_probe_gap_ms() -> u64 {
    200
}

fn default_initial_render_wait_ms() -> u64 {
    3500
}

fn default_inter_item_delay_ms() -> u64 {
    2000
}

fn default_history_size() -> usize {
    200
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}

fn default_webdriver_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
}

fn default_backend_timeout() -> u64 {
    10
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    1000
}
