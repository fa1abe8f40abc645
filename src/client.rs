//! HTTP client for the remote task API
//!
//! [`GraphClient`] owns the bearer credential for one ingestion run and
//! exposes two operations: a single-page fetch (one request/response
//! exchange, classified into [`FetchError`] variants for the retry
//! executor) and [`GraphClient::pages`], the lazy page sequence that
//! follows `@odata.nextLink` cursors until a page carries none.

use crate::auth::AccessToken;
use crate::config::RetryConfig;
use crate::error::FetchError;
use crate::retry::fetch_with_retry;
use crate::types::Page;
use futures::stream::{self, Stream};
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client for the remote task API
///
/// Cheap to clone: the underlying `reqwest::Client` is a shared handle and
/// the token is reference-counted by clone. One `GraphClient` serves one
/// ingestion run.
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    token: AccessToken,
    retry: RetryConfig,
}

impl GraphClient {
    /// Create a client from an HTTP handle, a bearer token, and the retry
    /// policy applied to every page fetch.
    pub fn new(http: reqwest::Client, token: AccessToken, retry: RetryConfig) -> Self {
        Self { http, token, retry }
    }

    /// Fetch and decode one page of a paginated collection.
    ///
    /// This is a single request/response exchange with no retry of its own;
    /// resilience lives in [`fetch_with_retry`]. A 429 response is mapped to
    /// [`FetchError::RateLimited`] with the parsed `Retry-After` header (in
    /// seconds) so the executor can honor the server's request.
    pub async fn fetch_page<T>(&self, url: &str) -> Result<Page<T>, FetchError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http
            .get(url)
            .bearer_auth(self.token.secret())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(FetchError::RateLimited {
                url: url.to_string(),
                retry_after,
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Lazy, finite, non-restartable sequence of pages starting at
    /// `start_url`.
    ///
    /// Each element is one page fetched through the retry executor.
    /// Iteration terminates after a page without a continuation cursor. If
    /// a page's retry budget is exhausted the stream yields `Err` at that
    /// page; pages already yielded remain with the caller (no silent
    /// truncation, no restart).
    pub fn pages<T>(
        &self,
        start_url: String,
    ) -> impl Stream<Item = Result<Page<T>, FetchError>> + '_
    where
        T: DeserializeOwned,
    {
        stream::try_unfold(Some(start_url), move |state| async move {
            let Some(url) = state else {
                return Ok(None);
            };
            let page: Page<T> =
                fetch_with_retry(&self.retry, || self.fetch_page::<T>(&url)).await?;
            let next = page.next_link.clone();
            Ok(Some((page, next)))
        })
    }
}
