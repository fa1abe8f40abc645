//! # todo-ingest
//!
//! Backend library for ingesting a user's completed Microsoft To Do tasks
//! through the Microsoft Graph API.
//!
//! ## Design Philosophy
//!
//! todo-ingest is designed to be:
//! - **Resilient** - every page fetch is retried with rate-limit aware backoff
//! - **Bounded** - at most a configurable number of lists is fetched at once
//! - **Partial-failure tolerant** - one bad list never fails the whole run
//! - **Library-first** - no CLI or UI, purely a Rust crate for embedding
//!
//! The crate does not implement a sign-in UI: callers supply a
//! [`CredentialProvider`] wrapping their identity library, and the pipeline
//! applies a silent-then-interactive acquisition sequence on top of it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use async_trait::async_trait;
//! use todo_ingest::{AccessToken, AuthError, Config, CredentialProvider, TodoIngestor};
//!
//! /// Wraps the host application's identity library
//! struct MyIdentity;
//!
//! #[async_trait]
//! impl CredentialProvider for MyIdentity {
//!     async fn acquire_silent(&self) -> Result<AccessToken, AuthError> {
//!         unimplemented!("renew a cached session")
//!     }
//!
//!     async fn acquire_interactive(
//!         &self,
//!         _scopes: &[String],
//!     ) -> Result<AccessToken, AuthError> {
//!         unimplemented!("open the sign-in flow")
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ingestor = TodoIngestor::new(Config::default())?;
//!     let tasks = ingestor
//!         .fetch_all_completed_tasks(
//!             &MyIdentity,
//!             Some(std::sync::Arc::new(|loaded| println!("{loaded} tasks so far"))),
//!         )
//!         .await?;
//!     println!("fetched {} completed tasks", tasks.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Credential acquisition
pub mod auth;
/// HTTP client and paginated fetching
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// The ingestion pipeline
pub mod ingest;
/// Ingestion progress reporting
pub mod progress;
/// Retry logic with rate-limit aware exponential backoff
pub mod retry;
/// Core domain and wire types
pub mod types;

// Re-export commonly used types
pub use auth::{AccessToken, CredentialProvider};
pub use client::GraphClient;
pub use config::{Config, RetryConfig};
pub use error::{AuthError, Error, FetchError, Result};
pub use ingest::TodoIngestor;
pub use progress::{ProgressCounter, ProgressFn};
pub use types::{Page, Task, TaskList};

/// Fetch every completed task across all lists using the default
/// configuration.
///
/// Convenience wrapper over [`TodoIngestor`] for callers that do not need
/// to customize endpoints, page sizes, retry behavior, or concurrency.
///
/// # Errors
///
/// [`Error::Auth`] when no usable credential can be produced,
/// [`Error::Fetch`] when list discovery fails.
pub async fn fetch_all_completed_tasks(
    provider: &dyn CredentialProvider,
    on_progress: Option<ProgressFn>,
) -> Result<Vec<Task>> {
    TodoIngestor::new(Config::default())?
        .fetch_all_completed_tasks(provider, on_progress)
        .await
}
