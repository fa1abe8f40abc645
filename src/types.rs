//! Core domain and wire types
//!
//! The remote API speaks a paginated envelope of `{ value: [...],
//! "@odata.nextLink": "..." }`. Wire records ([`RemoteTask`]) are transient
//! and consumed during mapping; the pipeline's output unit is [`Task`],
//! which by construction only exists for completed items.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named container of tasks in the remote system
///
/// Immutable once fetched; lives for the duration of one ingestion run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    /// Opaque identifier assigned by the remote system
    pub id: String,

    /// Human-readable list name
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// One completed to-do item (the pipeline's output unit)
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Task {
    /// Task identifier. Unique within its source list but not guaranteed
    /// globally unique across lists; the pipeline does not de-duplicate.
    pub id: String,

    /// Task title
    pub title: String,

    /// Completion timestamp (UTC). Tasks without one are dropped during
    /// mapping, so every `Task` the pipeline emits is a completed one.
    pub completed_at: DateTime<Utc>,

    /// Task body content; empty when the upstream record carries no body
    pub description: String,
}

/// Wire-shape task record as returned by the tasks endpoint
///
/// Transient; consumed only during mapping.
#[derive(Clone, Debug, Deserialize)]
pub struct RemoteTask {
    /// Task identifier
    pub id: String,

    /// Task title
    pub title: String,

    /// Completion timestamp, absent for tasks that are still open
    #[serde(rename = "completedDateTime")]
    pub completed_date_time: Option<DateTimeTimeZone>,

    /// Optional task body
    #[serde(default)]
    pub body: Option<TaskBody>,
}

/// A timestamp paired with the time zone it was recorded in
#[derive(Clone, Debug, Deserialize)]
pub struct DateTimeTimeZone {
    /// ISO-8601 timestamp, possibly without an offset (the Graph API emits
    /// e.g. `2024-01-15T10:30:00.0000000` with the zone carried separately)
    #[serde(rename = "dateTime")]
    pub date_time: String,

    /// Time zone name; the API reports completion timestamps in UTC
    #[serde(rename = "timeZone", default)]
    pub time_zone: Option<String>,
}

impl DateTimeTimeZone {
    /// Parse the timestamp as UTC.
    ///
    /// Accepts full RFC 3339 (offset honored) or a naive ISO-8601 timestamp
    /// with optional fractional seconds, which is taken to be UTC.
    pub fn parse_utc(&self) -> Result<DateTime<Utc>, chrono::ParseError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.date_time) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.date_time, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
    }
}

/// Body content of a wire-shape task record
#[derive(Clone, Debug, Deserialize)]
pub struct TaskBody {
    /// Body text
    #[serde(default)]
    pub content: String,
}

impl RemoteTask {
    /// Map a wire record into the domain model.
    ///
    /// Returns `None` for tasks without a completion timestamp (the filter
    /// invariant) and for records whose timestamp cannot be parsed, which
    /// are skipped rather than failing the page.
    pub fn into_task(self) -> Option<Task> {
        let completed = self.completed_date_time?;
        let completed_at = match completed.parse_utc() {
            Ok(ts) => ts,
            Err(e) => {
                tracing::debug!(
                    task = %self.id,
                    raw = %completed.date_time,
                    error = %e,
                    "skipping task with unparseable completion timestamp"
                );
                return None;
            }
        };
        Some(Task {
            id: self.id,
            title: self.title,
            completed_at,
            description: self.body.map(|b| b.content).unwrap_or_default(),
        })
    }
}

/// One page of a paginated collection response
///
/// The unit a single network call returns. An absent `next_link`
/// terminates pagination for that resource.
#[derive(Clone, Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    /// Items carried by this page
    #[serde(default)]
    pub value: Vec<T>,

    /// Continuation cursor; absent on the final page
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}
