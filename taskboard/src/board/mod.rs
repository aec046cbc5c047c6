//! Board state management for `TaskBoard`.
//!
//! Provides the optimistic [`TaskStore`]: mutations apply to the
//! in-memory collection immediately, a reconciling network call follows,
//! and a failed reconciliation rolls the task back to its last confirmed
//! state. Store changes that a UI needs to react to asynchronously are
//! broadcast as [`BoardEvent`]s.

pub mod store;

pub use store::TaskStore;

use chrono::NaiveDate;

use taskboard_proto::task::{ColumnId, Priority, Task, TaskId, UserId};

/// A single field edit applied to a task.
///
/// Optimistic updates carry a list of these; `None` payloads clear the
/// corresponding optional field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    /// Replace the title.
    Title(String),
    /// Replace or clear the description.
    Description(Option<String>),
    /// Replace or clear the priority.
    Priority(Option<Priority>),
    /// Replace or clear the due date.
    DueDate(Option<NaiveDate>),
    /// Move to another column.
    Column(ColumnId),
    /// Reposition within the column.
    Order(i64),
    /// Replace or clear the assignee.
    Assignee(Option<UserId>),
}

/// Applies one field edit to a task in place.
pub fn apply_change(task: &mut Task, change: TaskChange) {
    match change {
        TaskChange::Title(title) => task.title = title,
        TaskChange::Description(description) => task.description = description,
        TaskChange::Priority(priority) => task.priority = priority,
        TaskChange::DueDate(due_date) => task.due_date = due_date,
        TaskChange::Column(column_id) => task.column_id = column_id,
        TaskChange::Order(order) => task.order = order,
        TaskChange::Assignee(assignee_id) => task.assignee_id = assignee_id,
    }
}

/// Events emitted by the [`TaskStore`] for UI notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// The process-wide syncing signal flipped.
    ///
    /// This is a UI overlay hint, not a completion tracker: with several
    /// reconciliations in flight it is cleared by whichever finishes
    /// last.
    SyncingChanged {
        /// The new flag value.
        syncing: bool,
    },
    /// A failed reconciliation rolled a task back to its snapshot.
    TaskReverted {
        /// The task that snapped back.
        task_id: TaskId,
    },
    /// A failed delete restored the removed task (and the rest of the
    /// prior collection).
    DeleteReverted {
        /// The task that reappeared.
        task_id: TaskId,
    },
}

/// Result of an optimistic update.
///
/// Operating on an unknown task id is deliberately not an error: a
/// stale drag gesture on a just-removed card should dissolve, not crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum UpdateOutcome {
    /// The changes were applied and reconciliation can proceed.
    Applied,
    /// No task with that id exists; nothing happened.
    Ignored,
}

/// Result of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum DeleteOutcome {
    /// The task was removed here and remotely.
    Deleted,
    /// No task with that id exists; nothing happened.
    Ignored,
}
