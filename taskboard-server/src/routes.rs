//! HTTP routes for the task API.
//!
//! Thin axum handlers over the [`TaskTable`]: they parse ids and bodies,
//! delegate to the table, and map [`TableError`] values onto HTTP
//! statuses (unknown task → 404, unknown reference → 422). Every failure
//! body is a JSON [`ErrorResponse`].

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};

use taskboard_proto::api::{CreateTaskRequest, ErrorResponse, TaskWithRefs, UpdateTaskRequest};
use taskboard_proto::task::TaskId;

use crate::store::{TableError, TaskTable};

/// Shared server state handed to every handler.
#[derive(Debug, Default)]
pub struct ServerState {
    /// The in-memory task table.
    pub table: TaskTable,
}

impl ServerState {
    /// Creates state around an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Maps a table error onto its HTTP status.
fn error_response(err: &TableError) -> Response {
    let status = match err {
        TableError::UnknownTask(_) => StatusCode::NOT_FOUND,
        TableError::UnknownBoard(_) | TableError::UnknownColumn(_) | TableError::UnknownUser(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// Builds the API router.
pub fn router(state: Arc<ServerState>) -> axum::Router {
    axum::Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            put(update_task).delete(delete_task),
        )
        .with_state(state)
}

/// `GET /api/tasks` — all tasks with resolved references, ascending by order.
async fn list_tasks(State(state): State<Arc<ServerState>>) -> Json<Vec<TaskWithRefs>> {
    Json(state.table.list().await)
}

/// `POST /api/tasks` — create a task, returning 201 and the created record.
async fn create_task(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<CreateTaskRequest>,
) -> Response {
    match state.table.create(&req).await {
        Ok(task) => {
            tracing::info!(task_id = %task.id, column_id = %task.column_id, "task created");
            (StatusCode::CREATED, Json(task)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "create rejected");
            error_response(&e)
        }
    }
}

/// `PUT /api/tasks/{id}` — full-record replacement of a task's mutable fields.
async fn update_task(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Response {
    let task_id = TaskId::new(id);
    match state.table.update(&task_id, &req).await {
        Ok(task) => {
            tracing::debug!(task_id = %task.id, column_id = %task.column_id, order = task.order, "task updated");
            Json(task).into_response()
        }
        Err(e) => {
            tracing::warn!(task_id = %task_id, error = %e, "update rejected");
            error_response(&e)
        }
    }
}

/// `DELETE /api/tasks/{id}` — remove a task, returning 204.
async fn delete_task(State(state): State<Arc<ServerState>>, Path(id): Path<String>) -> Response {
    let task_id = TaskId::new(id);
    match state.table.delete(&task_id).await {
        Ok(()) => {
            tracing::info!(task_id = %task_id, "task deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            tracing::warn!(task_id = %task_id, error = %e, "delete rejected");
            error_response(&e)
        }
    }
}

/// Starts the API server on the given address with the given state.
///
/// Returns the bound address (useful with port 0) and the serve task's
/// join handle, so tests can run a real server on an ephemeral port.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or report its address.
pub async fn start_server(
    addr: &str,
    state: Arc<ServerState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "task API server error");
        }
    });

    Ok((bound_addr, handle))
}
