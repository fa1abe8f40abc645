//! Retry logic with rate-limit aware exponential backoff
//!
//! This module wraps a single page fetch with the pipeline's resilience
//! policy. It knows nothing about pagination or domain shape; it only sees
//! an operation that either succeeds or yields a [`FetchError`].
//!
//! Policy, per attempt:
//! - A 429 response sleeps for the server-supplied `Retry-After` (floored
//!   at the configured initial delay) and retries without advancing the
//!   exponential sequence.
//! - Any other failure sleeps for the current exponential delay (doubling
//!   each time, capped at the configured maximum, optionally jittered).
//! - Both paths consume the shared attempt budget; when it is exhausted
//!   the last observed error is returned.
//!
//! # Example
//!
//! ```no_run
//! use todo_ingest::retry::fetch_with_retry;
//! use todo_ingest::config::RetryConfig;
//! use todo_ingest::error::FetchError;
//!
//! # async fn example() -> Result<(), FetchError> {
//! let config = RetryConfig::default();
//! let body = fetch_with_retry(&config, || async {
//!     // One request/response exchange goes here
//!     Ok::<String, FetchError>("page".to_string())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::FetchError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Execute one network exchange with the retry/backoff policy applied
///
/// # Arguments
///
/// * `config` - Retry configuration (attempt budget, delays, multiplier, jitter)
/// * `operation` - Async closure performing a single request/response exchange
///
/// # Returns
///
/// The first successful result, or the last observed [`FetchError`] once
/// the attempt budget is exhausted. A successful response short-circuits
/// immediately. A `max_attempts` of 0 is treated as 1.
pub async fn fetch_with_retry<F, Fut, T>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let budget = config.max_attempts.max(1);
    let mut delay = config.initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "fetch succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if attempt >= budget => {
                tracing::error!(
                    error = %e,
                    attempts = attempt,
                    "fetch failed after all retry attempts exhausted"
                );
                return Err(e);
            }
            Err(e) if e.is_rate_limited() => {
                let wait = e
                    .retry_after()
                    .unwrap_or(config.initial_delay)
                    .max(config.initial_delay);
                tracing::warn!(
                    attempt = attempt,
                    max_attempts = budget,
                    delay_ms = wait.as_millis() as u64,
                    "rate limited, honoring server-requested delay"
                );
                tokio::time::sleep(wait).await;
                // rate-limit waits leave the exponential sequence untouched
                attempt += 1;
            }
            Err(e) => {
                let sleep_for = if config.jitter { add_jitter(delay) } else { delay };
                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = budget,
                    delay_ms = sleep_for.as_millis() as u64,
                    "fetch failed, backing off before retry"
                );
                tokio::time::sleep(sleep_for).await;
                delay = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
                    .min(config.max_delay);
                attempt += 1;
            }
        }
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay, so the
/// actual delay lands between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
