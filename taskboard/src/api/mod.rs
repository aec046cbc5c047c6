//! Persistence API abstraction for the board client.
//!
//! Defines the [`TaskApi`] trait the store reconciles against. Concrete
//! implementations:
//! - [`http::HttpTaskApi`] — reqwest-based client for the real server
//! - [`loopback::LoopbackApi`] — in-process fake with failure injection,
//!   for tests

pub mod http;
pub mod loopback;

pub use http::HttpTaskApi;
pub use loopback::LoopbackApi;

use taskboard_proto::api::{CreateTaskRequest, TaskWithRefs, UpdateTaskRequest};
use taskboard_proto::task::TaskId;

/// Errors that can occur when talking to the persistence API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("server returned status {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// The request never completed (connection, timeout, decode).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API base URL could not be combined with a request path.
    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    /// The backend is unreachable (used by test fakes to inject failure).
    #[error("persistence unavailable: {0}")]
    Unavailable(String),
}

/// Async client for the task persistence API.
///
/// Mirrors the four HTTP endpoints one-to-one. Implementations surface
/// any non-success status as [`ApiError::Status`] and never retry; the
/// store layer decides what a failure means (rollback or propagate).
pub trait TaskApi: Send + Sync {
    /// Fetch every task with its references resolved.
    fn list_tasks(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<TaskWithRefs>, ApiError>> + Send;

    /// Create a task. The server mints the id and defaults the priority.
    fn create_task(
        &self,
        request: &CreateTaskRequest,
    ) -> impl std::future::Future<Output = Result<TaskWithRefs, ApiError>> + Send;

    /// Replace a task's mutable fields with the given full record.
    fn update_task(
        &self,
        task_id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> impl std::future::Future<Output = Result<TaskWithRefs, ApiError>> + Send;

    /// Delete a task.
    fn delete_task(
        &self,
        task_id: &TaskId,
    ) -> impl std::future::Future<Output = Result<(), ApiError>> + Send;
}
