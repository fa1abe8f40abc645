//! Pipeline tests against a mocked remote API
//!
//! Everything here drives the full `TodoIngestor` surface against wiremock,
//! covering the filter invariant, pagination, partial-failure isolation,
//! the concurrency bound, and progress reporting.

use super::*;
use crate::auth::AccessToken;
use crate::config::RetryConfig;
use crate::error::{AuthError, Error};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Provider that always succeeds silently
struct StaticProvider;

#[async_trait]
impl CredentialProvider for StaticProvider {
    async fn acquire_silent(&self) -> std::result::Result<AccessToken, AuthError> {
        Ok(AccessToken::new("test-token"))
    }

    async fn acquire_interactive(
        &self,
        _scopes: &[String],
    ) -> std::result::Result<AccessToken, AuthError> {
        panic!("interactive acquisition must not be reached in these tests");
    }
}

/// Provider for which both acquisition paths fail
struct NoCredentialProvider {
    interactive_calls: AtomicU32,
}

#[async_trait]
impl CredentialProvider for NoCredentialProvider {
    async fn acquire_silent(&self) -> std::result::Result<AccessToken, AuthError> {
        Err(AuthError::NoAccount)
    }

    async fn acquire_interactive(
        &self,
        _scopes: &[String],
    ) -> std::result::Result<AccessToken, AuthError> {
        self.interactive_calls.fetch_add(1, Ordering::SeqCst);
        Err(AuthError::InteractiveFailed("sign-in cancelled".to_string()))
    }
}

fn test_config(server: &MockServer) -> Config {
    Config {
        lists_endpoint: format!("{}/me/todo/lists", server.uri()),
        retry: RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            jitter: false,
        },
        request_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

fn lists_body(lists: &[(&str, &str)]) -> serde_json::Value {
    json!({
        "value": lists
            .iter()
            .map(|(id, name)| json!({"id": id, "displayName": name}))
            .collect::<Vec<_>>(),
    })
}

fn completed_task(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "completedDateTime": {"dateTime": "2024-05-01T09:00:00.0000000", "timeZone": "UTC"},
        "body": {"content": format!("notes for {id}")},
    })
}

fn open_task(id: &str, title: &str) -> serde_json::Value {
    json!({"id": id, "title": title, "completedDateTime": null})
}

fn tasks_body(tasks: Vec<serde_json::Value>, next: Option<String>) -> serde_json::Value {
    let mut body = json!({ "value": tasks });
    if let Some(next) = next {
        body["@odata.nextLink"] = json!(next);
    }
    body
}

async fn mount_lists(server: &MockServer, lists: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/me/todo/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lists_body(lists)))
        .mount(server)
        .await;
}

async fn mount_tasks(server: &MockServer, list_id: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/me/todo/lists/{list_id}/tasks")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn end_to_end_two_lists_emits_only_completed_tasks() {
    let server = MockServer::start().await;
    mount_lists(&server, &[("work", "Work"), ("home", "Home")]).await;
    mount_tasks(
        &server,
        "work",
        tasks_body(
            vec![
                completed_task("t1", "Ship release"),
                open_task("t2", "Water plants"),
                completed_task("t3", "File expenses"),
            ],
            None,
        ),
    )
    .await;
    mount_tasks(&server, "home", tasks_body(vec![], None)).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let ingestor = TodoIngestor::new(test_config(&server)).unwrap();
    let tasks = ingestor
        .fetch_all_completed_tasks(
            &StaticProvider,
            Some(Arc::new(move |total| {
                seen_clone.lock().unwrap().push(total);
            })),
        )
        .await
        .unwrap();

    assert_eq!(tasks.len(), 2, "the open task must be filtered out");
    let mut ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["t1", "t3"]);
    assert!(
        tasks.iter().all(|t| !t.description.is_empty()),
        "body content must be carried through"
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.last().copied(), Some(2), "final progress equals result size");
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn tasks_within_one_list_preserve_page_order() {
    let server = MockServer::start().await;
    mount_lists(&server, &[("work", "Work")]).await;
    mount_tasks(
        &server,
        "work",
        tasks_body(
            vec![completed_task("t1", "a"), completed_task("t2", "b")],
            Some(format!("{}/work-page2", server.uri())),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/work-page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tasks_body(
            vec![completed_task("t3", "c"), completed_task("t4", "d")],
            None,
        )))
        .mount(&server)
        .await;

    let ingestor = TodoIngestor::new(test_config(&server)).unwrap();
    let tasks = ingestor
        .fetch_all_completed_tasks(&StaticProvider, None)
        .await
        .unwrap();

    let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3", "t4"]);
}

#[tokio::test]
async fn one_failing_list_keeps_results_from_the_others() {
    let server = MockServer::start().await;
    mount_lists(
        &server,
        &[("alpha", "Alpha"), ("bravo", "Bravo"), ("charlie", "Charlie")],
    )
    .await;
    mount_tasks(
        &server,
        "alpha",
        tasks_body(vec![completed_task("a1", "x")], None),
    )
    .await;
    // Bravo yields one good page, then its continuation dies for good
    mount_tasks(
        &server,
        "bravo",
        tasks_body(
            vec![completed_task("b1", "y")],
            Some(format!("{}/bravo-page2", server.uri())),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/bravo-page2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_tasks(
        &server,
        "charlie",
        tasks_body(vec![completed_task("c1", "z")], None),
    )
    .await;

    let ingestor = TodoIngestor::new(test_config(&server)).unwrap();
    let tasks = ingestor
        .fetch_all_completed_tasks(&StaticProvider, None)
        .await
        .unwrap();

    let mut ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(
        ids,
        vec!["a1", "b1", "c1"],
        "healthy lists and bravo's partial page must all survive"
    );
}

#[tokio::test]
async fn list_discovery_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/todo/lists"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ingestor = TodoIngestor::new(test_config(&server)).unwrap();
    let result = ingestor
        .fetch_all_completed_tasks(&StaticProvider, None)
        .await;

    assert!(matches!(result, Err(Error::Fetch(_))));
    // 3 retry attempts against the lists endpoint, nothing else
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn auth_failure_surfaces_before_any_network_traffic() {
    let server = MockServer::start().await;
    mount_lists(&server, &[("work", "Work")]).await;

    let provider = NoCredentialProvider {
        interactive_calls: AtomicU32::new(0),
    };
    let ingestor = TodoIngestor::new(test_config(&server)).unwrap();
    let result = ingestor.fetch_all_completed_tasks(&provider, None).await;

    assert!(matches!(
        result,
        Err(Error::Auth(AuthError::InteractiveFailed(_)))
    ));
    assert_eq!(
        provider.interactive_calls.load(Ordering::SeqCst),
        1,
        "exactly one interactive attempt"
    );
    assert!(
        server.received_requests().await.unwrap().is_empty(),
        "no requests may be issued without a credential"
    );
}

/// Records request arrival instants and answers an empty page after a delay
struct RecordingResponder {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    delay: Duration,
}

impl Respond for RecordingResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        if let Ok(mut arrivals) = self.arrivals.lock() {
            arrivals.push(Instant::now());
        }
        ResponseTemplate::new(200)
            .set_delay(self.delay)
            .set_body_json(json!({"value": [completed_task("t", "t")]}))
    }
}

#[tokio::test]
async fn no_more_than_the_configured_number_of_lists_are_in_flight() {
    let server = MockServer::start().await;
    let lists: Vec<(String, String)> = (0..10)
        .map(|i| (format!("list{i}"), format!("List {i}")))
        .collect();
    let list_refs: Vec<(&str, &str)> = lists
        .iter()
        .map(|(id, name)| (id.as_str(), name.as_str()))
        .collect();
    mount_lists(&server, &list_refs).await;

    let delay = Duration::from_millis(200);
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    Mock::given(method("GET"))
        .and(path_regex(r"^/me/todo/lists/list\d+/tasks$"))
        .respond_with(RecordingResponder {
            arrivals: arrivals.clone(),
            delay,
        })
        .mount(&server)
        .await;

    let start = Instant::now();
    let ingestor = TodoIngestor::new(test_config(&server)).unwrap();
    let tasks = ingestor
        .fetch_all_completed_tasks(&StaticProvider, None)
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(tasks.len(), 10);
    let arrivals = arrivals.lock().unwrap();
    assert_eq!(arrivals.len(), 10, "one request per list");

    // A request is in flight for ~`delay` after arrival. Count, at each
    // arrival, how many requests arrived within the preceding half-delay
    // window and were therefore still being served.
    let window = delay / 2;
    let max_overlap = arrivals
        .iter()
        .map(|at| {
            arrivals
                .iter()
                .filter(|other| **other <= *at && at.duration_since(**other) < window)
                .count()
        })
        .max()
        .unwrap_or(0);
    assert!(
        max_overlap <= 3,
        "more than 3 per-list fetches overlapped (saw {max_overlap})"
    );
    assert!(
        max_overlap >= 2,
        "fetches should actually run concurrently (saw {max_overlap})"
    );
    // 10 lists at 3 in flight need at least 4 sequential waves
    assert!(
        elapsed >= delay * 3,
        "run finished too fast for a bounded pool, took {elapsed:?}"
    );
}

#[tokio::test]
async fn progress_is_monotonic_and_final_value_matches_result_size() {
    let server = MockServer::start().await;
    mount_lists(&server, &[("a", "A"), ("b", "B"), ("c", "C")]).await;
    mount_tasks(
        &server,
        "a",
        tasks_body(
            vec![completed_task("a1", "x"), completed_task("a2", "y")],
            Some(format!("{}/a-page2", server.uri())),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/a-page2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(tasks_body(vec![completed_task("a3", "z")], None)),
        )
        .mount(&server)
        .await;
    mount_tasks(
        &server,
        "b",
        tasks_body(vec![completed_task("b1", "x"), open_task("b2", "open")], None),
    )
    .await;
    mount_tasks(&server, "c", tasks_body(vec![], None)).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let ingestor = TodoIngestor::new(test_config(&server)).unwrap();
    let tasks = ingestor
        .fetch_all_completed_tasks(
            &StaticProvider,
            Some(Arc::new(move |total| {
                seen_clone.lock().unwrap().push(total);
            })),
        )
        .await
        .unwrap();

    assert_eq!(tasks.len(), 4);
    let seen = seen.lock().unwrap();
    assert!(
        seen.windows(2).all(|w| w[0] <= w[1]),
        "progress must never decrease: {seen:?}"
    );
    assert_eq!(seen.last().copied(), Some(4));
}

#[tokio::test]
async fn duplicate_ids_across_lists_pass_through_unchanged() {
    // Task ids are only unique per list; the pipeline deliberately does not
    // de-duplicate across lists.
    let server = MockServer::start().await;
    mount_lists(&server, &[("a", "A"), ("b", "B")]).await;
    mount_tasks(
        &server,
        "a",
        tasks_body(vec![completed_task("shared", "from A")], None),
    )
    .await;
    mount_tasks(
        &server,
        "b",
        tasks_body(vec![completed_task("shared", "from B")], None),
    )
    .await;

    let ingestor = TodoIngestor::new(test_config(&server)).unwrap();
    let tasks = ingestor
        .fetch_all_completed_tasks(&StaticProvider, None)
        .await
        .unwrap();

    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t.id == "shared"));
}

#[tokio::test]
async fn empty_list_collection_yields_empty_result() {
    let server = MockServer::start().await;
    mount_lists(&server, &[]).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let ingestor = TodoIngestor::new(test_config(&server)).unwrap();
    let tasks = ingestor
        .fetch_all_completed_tasks(
            &StaticProvider,
            Some(Arc::new(move |total| {
                seen_clone.lock().unwrap().push(total);
            })),
        )
        .await
        .unwrap();

    assert!(tasks.is_empty());
    assert!(seen.lock().unwrap().is_empty(), "no progress without tasks");
}
