//! The ingestion pipeline
//!
//! Control flow for one run: credential acquisition → list discovery →
//! bounded-concurrency scheduling of per-list task fetches. The scheduler
//! is the sole writer into the aggregate result; individual fetches only
//! touch the shared [`ProgressCounter`].

use crate::auth::{CredentialProvider, acquire_token};
use crate::client::GraphClient;
use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::progress::{ProgressCounter, ProgressFn};
use crate::types::{RemoteTask, Task, TaskList};
use futures::StreamExt;
use std::pin::pin;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

/// Ingestion pipeline handle
///
/// Holds the validated configuration and the HTTP client for the life of
/// the value; each call to
/// [`fetch_all_completed_tasks`](TodoIngestor::fetch_all_completed_tasks)
/// is one independent ingestion run.
pub struct TodoIngestor {
    config: Arc<Config>,
    http: reqwest::Client,
}

impl TodoIngestor {
    /// Create an ingestor from a configuration.
    ///
    /// Validates the configuration and builds the HTTP client with the
    /// configured per-request timeout.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(FetchError::from)?;
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    /// Fetch every completed task across all of the user's task lists.
    ///
    /// Acquires a credential (silent first, one interactive fallback),
    /// discovers all task lists, then fetches each list's tasks with at
    /// most `max_concurrent_lists` lists in flight. The optional
    /// `on_progress` observer receives the cumulative accepted-task count
    /// each time it grows.
    ///
    /// Ordering: tasks from one list stay in the order the server produced
    /// them; ordering across lists follows completion order of the
    /// concurrent fetches and is not deterministic.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Auth`] when no usable credential can be produced and
    /// [`crate::Error::Fetch`] when list discovery fails; a failure inside one
    /// list's pagination is logged and that list contributes whatever it
    /// gathered before the failure.
    pub async fn fetch_all_completed_tasks(
        &self,
        provider: &dyn CredentialProvider,
        on_progress: Option<ProgressFn>,
    ) -> Result<Vec<Task>> {
        let token = acquire_token(provider, &self.config.scopes).await?;
        let client = GraphClient::new(self.http.clone(), token, self.config.retry.clone());

        let lists = discover_lists(&client, &self.config).await?;
        tracing::info!(lists = lists.len(), "discovered task lists");

        let progress = ProgressCounter::new(on_progress);
        let tasks = ingest_lists(client, Arc::clone(&self.config), lists, progress).await;
        tracing::info!(tasks = tasks.len(), "ingestion run complete");
        Ok(tasks)
    }
}

/// Enumerate all task lists by draining the page sequence for the
/// collection endpoint.
///
/// Server order is preserved. Any page failure here is fatal to the run:
/// without the full set of lists the pipeline cannot proceed.
pub(crate) async fn discover_lists(
    client: &GraphClient,
    config: &Config,
) -> std::result::Result<Vec<TaskList>, FetchError> {
    let start = format!(
        "{}?$top={}",
        config.lists_endpoint, config.list_page_size
    );
    let mut pages = pin!(client.pages::<TaskList>(start));
    let mut lists = Vec::new();
    while let Some(page) = pages.next().await {
        lists.extend(page?.value);
    }
    Ok(lists)
}

/// Fetch every completed task in one list, page by page.
///
/// Raw tasks without a completion timestamp are filtered out; the rest are
/// mapped into the domain model and counted toward `progress` as each page
/// lands. This function never fails: a retry-budget exhaustion mid-list is
/// logged as a non-fatal event and whatever was gathered so far is
/// returned, so one bad list cannot abort the whole run.
pub(crate) async fn fetch_list_tasks(
    client: &GraphClient,
    config: &Config,
    list: &TaskList,
    progress: &ProgressCounter,
) -> Vec<Task> {
    let start = format!(
        "{}/{}/tasks?$top={}",
        config.lists_endpoint, list.id, config.task_page_size
    );
    let mut pages = pin!(client.pages::<RemoteTask>(start));
    let mut tasks = Vec::new();
    while let Some(page) = pages.next().await {
        let page = match page {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(
                    list = %list.display_name,
                    error = %e,
                    gathered = tasks.len(),
                    "task fetch failed mid-list, keeping partial results"
                );
                return tasks;
            }
        };
        let before = tasks.len();
        tasks.extend(page.value.into_iter().filter_map(RemoteTask::into_task));
        progress.record(tasks.len() - before);
    }
    tracing::debug!(list = %list.display_name, tasks = tasks.len(), "list fully fetched");
    tasks
}

/// Run per-list fetches over all discovered lists with bounded concurrency.
///
/// One task is spawned per list; a semaphore with `max_concurrent_lists`
/// permits caps how many actually fetch at a time. Results are merged as
/// tasks complete, so the aggregate's cross-list ordering is whatever the
/// race produces.
pub(crate) async fn ingest_lists(
    client: GraphClient,
    config: Arc<Config>,
    lists: Vec<TaskList>,
    progress: ProgressCounter,
) -> Vec<Task> {
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_lists));
    let mut in_flight = JoinSet::new();
    for list in lists {
        let client = client.clone();
        let config = Arc::clone(&config);
        let progress = progress.clone();
        let semaphore = Arc::clone(&semaphore);
        in_flight.spawn(async move {
            // The semaphore is never closed while the JoinSet is alive
            let Ok(_permit) = semaphore.acquire().await else {
                return Vec::new();
            };
            fetch_list_tasks(&client, &config, &list, &progress).await
        });
    }

    // Sole writer into the aggregate: merge each list's output as it lands
    let mut all_tasks = Vec::new();
    while let Some(joined) = in_flight.join_next().await {
        match joined {
            Ok(tasks) => all_tasks.extend(tasks),
            Err(e) => tracing::error!(error = %e, "per-list fetch task panicked"),
        }
    }
    all_tasks
}
