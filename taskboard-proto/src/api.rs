//! Request and response bodies for the `TaskBoard` HTTP API.
//!
//! The persistence server returns tasks with their references resolved
//! ([`TaskWithRefs`]); the client flattens those into plain
//! [`Task`](crate::task::Task) records at its store boundary via
//! [`TaskWithRefs::into_task`]. All bodies are camelCase JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::task::{BoardId, ColumnId, Priority, Task, TaskId, UserId};

/// Resolved reference to the board a task belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRef {
    /// Board identifier.
    pub id: BoardId,
    /// Board title.
    pub title: String,
}

/// Resolved reference to the column a task sits in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRef {
    /// Column identifier.
    pub id: ColumnId,
    /// Column title (e.g. "In Progress").
    pub title: String,
}

/// Resolved reference to a task's assignee: id, name, and email only,
/// never the full user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeRef {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
}

/// Resolved reference to a tag attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRef {
    /// Tag identifier.
    pub id: String,
    /// Tag label.
    pub name: String,
    /// Display color (CSS hex string).
    pub color: String,
}

/// A task as returned by the server: flat fields plus resolved
/// board, column, assignee, and tag references.
///
/// `priority` is concrete here because the server substitutes
/// [`Priority::Medium`] at creation when the request omits one, so a
/// persisted task always carries a priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithRefs {
    /// Stable unique identifier.
    pub id: TaskId,
    /// Short summary shown on the card.
    pub title: String,
    /// Longer free-form body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Priority (always set on persisted tasks).
    pub priority: Priority,
    /// Due date, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Position within the owning column.
    pub order: i64,
    /// Owning board id.
    pub board_id: BoardId,
    /// Owning column id.
    pub column_id: ColumnId,
    /// Assigned user id, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<UserId>,
    /// Resolved owning board.
    pub board: BoardRef,
    /// Resolved owning column.
    pub column: ColumnRef,
    /// Resolved assignee, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<AssigneeRef>,
    /// Resolved tags.
    #[serde(default)]
    pub tags: Vec<TagRef>,
}

impl TaskWithRefs {
    /// Flattens the expanded record into the client-held [`Task`] shape,
    /// dropping the resolved references.
    #[must_use]
    pub fn into_task(self) -> Task {
        Task {
            id: self.id,
            title: self.title,
            description: self.description,
            priority: Some(self.priority),
            due_date: self.due_date,
            order: self.order,
            board_id: self.board_id,
            column_id: self.column_id,
            assignee_id: self.assignee_id,
        }
    }
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Task title (required).
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional priority; the server defaults to `MEDIUM` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Optional due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Position within the destination column (required).
    pub order: i64,
    /// Destination board (required).
    pub board_id: BoardId,
    /// Destination column (required).
    pub column_id: ColumnId,
    /// Optional assignee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<UserId>,
}

/// Body of `PUT /api/tasks/{id}` — a full-record replacement of the
/// task's mutable fields.
///
/// Absent optionals are omitted from the JSON body rather than sent as
/// null; the server clears the corresponding field either way. `board_id`
/// is not part of the body; a task never changes boards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    /// New title.
    pub title: String,
    /// New description (`None` clears).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New priority (`None` leaves the persisted priority unchanged).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New due date (`None` clears).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// New position within the column.
    pub order: i64,
    /// New owning column.
    pub column_id: ColumnId,
    /// New assignee (`None` clears).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<UserId>,
}

impl From<&Task> for UpdateTaskRequest {
    /// Snapshots a task's full current field set into an update body,
    /// the shape the store sends on every reconciliation.
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            due_date: task.due_date,
            order: task.order,
            column_id: task.column_id.clone(),
            assignee_id: task.assignee_id.clone(),
        }
    }
}

/// JSON error body returned by the server on any failure status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable failure description.
    pub error: String,
}
