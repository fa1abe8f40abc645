//! Configuration types for todo-ingest

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Top-level configuration for the ingestion pipeline
///
/// Every field has a sensible default matching the public Microsoft Graph
/// To Do API, so `Config::default()` works out of the box. All fields can
/// be overridden through serde (e.g., from a JSON or TOML config file).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base endpoint for the task-list collection
    /// (default: `https://graph.microsoft.com/v1.0/me/todo/lists`)
    #[serde(default = "default_lists_endpoint")]
    pub lists_endpoint: String,

    /// OAuth scopes requested on interactive sign-in
    /// (default: `["User.Read", "Tasks.Read"]`)
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Page size hint when enumerating task lists (default: 999)
    #[serde(default = "default_list_page_size")]
    pub list_page_size: u32,

    /// Page size when enumerating tasks within one list (default: 400)
    #[serde(default = "default_task_page_size")]
    pub task_page_size: u32,

    /// Maximum number of lists fetched concurrently (default: 3)
    ///
    /// Each in-flight list paginates strictly sequentially; this bound
    /// caps the number of simultaneously active per-list fetches.
    #[serde(default = "default_max_concurrent_lists")]
    pub max_concurrent_lists: usize,

    /// Per-request timeout (default: 30 seconds)
    ///
    /// A timed-out request surfaces as a transport failure and feeds into
    /// the same retry/backoff accounting as any other transient failure.
    #[serde(default = "default_request_timeout", with = "duration_millis")]
    pub request_timeout: Duration,

    /// Retry behavior for individual page fetches
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lists_endpoint: default_lists_endpoint(),
            scopes: default_scopes(),
            list_page_size: default_list_page_size(),
            task_page_size: default_task_page_size(),
            max_concurrent_lists: default_max_concurrent_lists(),
            request_timeout: default_request_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Validate the configuration, returning a keyed [`Error::Config`] for
    /// the first invalid setting found.
    pub fn validate(&self) -> Result<()> {
        let endpoint = Url::parse(&self.lists_endpoint).map_err(|e| Error::Config {
            message: format!("invalid lists_endpoint: {e}"),
            key: Some("lists_endpoint".to_string()),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!(
                    "lists_endpoint must be an http(s) URL, got scheme {:?}",
                    endpoint.scheme()
                ),
                key: Some("lists_endpoint".to_string()),
            });
        }
        if self.list_page_size == 0 {
            return Err(Error::Config {
                message: "list_page_size must be at least 1".to_string(),
                key: Some("list_page_size".to_string()),
            });
        }
        if self.task_page_size == 0 {
            return Err(Error::Config {
                message: "task_page_size must be at least 1".to_string(),
                key: Some("task_page_size".to_string()),
            });
        }
        if self.max_concurrent_lists == 0 {
            return Err(Error::Config {
                message: "max_concurrent_lists must be at least 1".to_string(),
                key: Some("max_concurrent_lists".to_string()),
            });
        }
        Ok(())
    }
}

/// Retry behavior for a single page fetch
///
/// A rate-limited (429) response sleeps for the server-requested delay
/// (floored at `initial_delay`) without advancing the exponential sequence;
/// any other failure backs off exponentially from `initial_delay`, capped
/// at `max_delay`. Both consume the shared `max_attempts` budget.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per page fetch, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff delay, also the rate-limit sleep floor (default: 500 ms)
    #[serde(default = "default_initial_delay", with = "duration_millis")]
    pub initial_delay: Duration,

    /// Cap applied to exponential delays (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_millis")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to exponential delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

fn default_lists_endpoint() -> String {
    "https://graph.microsoft.com/v1.0/me/todo/lists".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["User.Read".to_string(), "Tasks.Read".to_string()]
}

fn default_list_page_size() -> u32 {
    999
}

fn default_task_page_size() -> u32 {
    400
}

fn default_max_concurrent_lists() -> usize {
    3
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// Serialize `Duration` as whole milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
