//! In-memory task table, the server-side source of truth.
//!
//! The [`TaskTable`] holds task rows plus the small registries (boards,
//! columns, users, tags) needed to resolve response expansions. Reference
//! integrity is checked on every write: a task can only point at boards,
//! columns, and users the table knows about.

use std::collections::HashMap;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use taskboard_proto::api::{
    AssigneeRef, BoardRef, ColumnRef, CreateTaskRequest, TagRef, TaskWithRefs, UpdateTaskRequest,
};
use taskboard_proto::task::{BoardId, ColumnId, Priority, TaskId, UserId};

/// Errors that can occur when operating on the task table.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableError {
    /// No task with the given id exists.
    #[error("task not found: {0}")]
    UnknownTask(TaskId),

    /// The referenced board does not exist.
    #[error("board not found: {0}")]
    UnknownBoard(BoardId),

    /// The referenced column does not exist.
    #[error("column not found: {0}")]
    UnknownColumn(ColumnId),

    /// The referenced assignee does not exist.
    #[error("user not found: {0}")]
    UnknownUser(UserId),
}

/// A stored task row. Priority is always concrete server-side; the
/// create path substitutes `MEDIUM` when the request omits one.
#[derive(Debug, Clone)]
struct TaskRow {
    id: TaskId,
    title: String,
    description: Option<String>,
    priority: Priority,
    due_date: Option<NaiveDate>,
    order: i64,
    board_id: BoardId,
    column_id: ColumnId,
    assignee_id: Option<UserId>,
    tag_ids: Vec<String>,
}

#[derive(Debug, Clone)]
struct UserRow {
    name: String,
    email: String,
}

#[derive(Debug, Default)]
struct Tables {
    tasks: HashMap<TaskId, TaskRow>,
    boards: HashMap<BoardId, String>,
    columns: HashMap<ColumnId, String>,
    users: HashMap<UserId, UserRow>,
    tags: HashMap<String, TagRef>,
}

impl Tables {
    /// Resolves a row into the expanded response shape. Returns `None`
    /// if a referenced registry entry has gone missing, which a
    /// write-validated table should never produce.
    fn resolve(&self, row: &TaskRow) -> Option<TaskWithRefs> {
        let board = BoardRef {
            id: row.board_id.clone(),
            title: self.boards.get(&row.board_id)?.clone(),
        };
        let column = ColumnRef {
            id: row.column_id.clone(),
            title: self.columns.get(&row.column_id)?.clone(),
        };
        let assignee = match &row.assignee_id {
            Some(id) => {
                let user = self.users.get(id)?;
                Some(AssigneeRef {
                    id: id.clone(),
                    name: user.name.clone(),
                    email: user.email.clone(),
                })
            }
            None => None,
        };
        let tags = row
            .tag_ids
            .iter()
            .filter_map(|id| self.tags.get(id).cloned())
            .collect();

        Some(TaskWithRefs {
            id: row.id.clone(),
            title: row.title.clone(),
            description: row.description.clone(),
            priority: row.priority,
            due_date: row.due_date,
            order: row.order,
            board_id: row.board_id.clone(),
            column_id: row.column_id.clone(),
            assignee_id: row.assignee_id.clone(),
            board,
            column,
            assignee,
            tags,
        })
    }

    fn check_refs(
        &self,
        board_id: Option<&BoardId>,
        column_id: &ColumnId,
        assignee_id: Option<&UserId>,
    ) -> Result<(), TableError> {
        if let Some(board_id) = board_id
            && !self.boards.contains_key(board_id)
        {
            return Err(TableError::UnknownBoard(board_id.clone()));
        }
        if !self.columns.contains_key(column_id) {
            return Err(TableError::UnknownColumn(column_id.clone()));
        }
        if let Some(user_id) = assignee_id
            && !self.users.contains_key(user_id)
        {
            return Err(TableError::UnknownUser(user_id.clone()));
        }
        Ok(())
    }
}

/// Thread-safe in-memory task store with reference registries.
#[derive(Debug, Default)]
pub struct TaskTable {
    inner: RwLock<Tables>,
}

impl TaskTable {
    /// Creates an empty table with no boards, columns, or users.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a board the tasks may reference.
    pub async fn add_board(&self, id: BoardId, title: impl Into<String>) {
        self.inner.write().await.boards.insert(id, title.into());
    }

    /// Registers a column the tasks may reference.
    pub async fn add_column(&self, id: ColumnId, title: impl Into<String>) {
        self.inner.write().await.columns.insert(id, title.into());
    }

    /// Registers a user that tasks may be assigned to.
    pub async fn add_user(&self, id: UserId, name: impl Into<String>, email: impl Into<String>) {
        self.inner.write().await.users.insert(
            id,
            UserRow {
                name: name.into(),
                email: email.into(),
            },
        );
    }

    /// Registers a tag.
    pub async fn add_tag(&self, tag: TagRef) {
        self.inner.write().await.tags.insert(tag.id.clone(), tag);
    }

    /// Attaches a registered tag to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownTask`] if the task does not exist.
    pub async fn tag_task(
        &self,
        task_id: &TaskId,
        tag_id: impl Into<String>,
    ) -> Result<(), TableError> {
        let mut tables = self.inner.write().await;
        let row = tables
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TableError::UnknownTask(task_id.clone()))?;
        row.tag_ids.push(tag_id.into());
        Ok(())
    }

    /// Lists all tasks with resolved references, ascending by `order`.
    pub async fn list(&self) -> Vec<TaskWithRefs> {
        let tables = self.inner.read().await;
        let mut tasks: Vec<TaskWithRefs> = tables
            .tasks
            .values()
            .filter_map(|row| {
                let resolved = tables.resolve(row);
                if resolved.is_none() {
                    tracing::error!(
                        task_id = %row.id,
                        "task row references a missing registry entry"
                    );
                }
                resolved
            })
            .collect();
        tasks.sort_by_key(|t| t.order);
        tasks
    }

    /// Creates a task from a request body, minting a fresh id.
    ///
    /// Priority defaults to `MEDIUM` when the request omits one.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if the board, column, or assignee
    /// reference is unknown.
    pub async fn create(&self, req: &CreateTaskRequest) -> Result<TaskWithRefs, TableError> {
        let mut tables = self.inner.write().await;
        tables.check_refs(Some(&req.board_id), &req.column_id, req.assignee_id.as_ref())?;

        let row = TaskRow {
            id: TaskId::generate(),
            title: req.title.clone(),
            description: req.description.clone(),
            priority: req.priority.unwrap_or(Priority::Medium),
            due_date: req.due_date,
            order: req.order,
            board_id: req.board_id.clone(),
            column_id: req.column_id.clone(),
            assignee_id: req.assignee_id.clone(),
            tag_ids: Vec::new(),
        };

        let resolved = tables
            .resolve(&row)
            .ok_or_else(|| TableError::UnknownColumn(row.column_id.clone()))?;
        tables.tasks.insert(row.id.clone(), row);
        Ok(resolved)
    }

    /// Replaces a task's mutable fields wholesale from an update body.
    ///
    /// Omitted optionals clear the stored value, except priority, which
    /// is non-nullable server-side and keeps its previous value when the
    /// body omits one.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownTask`] if the task does not exist, or
    /// a reference error if the new column or assignee is unknown.
    pub async fn update(
        &self,
        task_id: &TaskId,
        req: &UpdateTaskRequest,
    ) -> Result<TaskWithRefs, TableError> {
        let mut tables = self.inner.write().await;
        tables.check_refs(None, &req.column_id, req.assignee_id.as_ref())?;

        let row = tables
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TableError::UnknownTask(task_id.clone()))?;

        row.title = req.title.clone();
        row.description = req.description.clone();
        if let Some(priority) = req.priority {
            row.priority = priority;
        }
        row.due_date = req.due_date;
        row.order = req.order;
        row.column_id = req.column_id.clone();
        row.assignee_id = req.assignee_id.clone();

        let row = row.clone();
        tables
            .resolve(&row)
            .ok_or(TableError::UnknownColumn(req.column_id.clone()))
    }

    /// Removes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownTask`] if the task does not exist.
    pub async fn delete(&self, task_id: &TaskId) -> Result<(), TableError> {
        let mut tables = self.inner.write().await;
        tables
            .tasks
            .remove(task_id)
            .map(|_| ())
            .ok_or_else(|| TableError::UnknownTask(task_id.clone()))
    }

    /// Seeds the classic three-column demo board with a handful of tasks.
    pub async fn seed_demo(&self) {
        let board = BoardId::new("board-1");
        self.add_board(board.clone(), "Main Board").await;
        self.add_column(ColumnId::new("todo"), "To Do").await;
        self.add_column(ColumnId::new("in-progress"), "In Progress")
            .await;
        self.add_column(ColumnId::new("done"), "Done").await;
        self.add_user(UserId::new("u-alice"), "Alice", "alice@example.com")
            .await;
        self.add_tag(TagRef {
            id: "tag-bug".to_string(),
            name: "bug".to_string(),
            color: "#d73a4a".to_string(),
        })
        .await;

        let seeds = [
            ("Write onboarding docs", "todo", 1, None),
            ("Fix login redirect", "in-progress", 1, Some(Priority::High)),
            ("Release v0.1", "done", 1, None),
        ];
        for (title, column, order, priority) in seeds {
            let created = self
                .create(&CreateTaskRequest {
                    title: title.to_string(),
                    description: None,
                    priority,
                    due_date: None,
                    order,
                    board_id: board.clone(),
                    column_id: ColumnId::new(column),
                    assignee_id: Some(UserId::new("u-alice")),
                })
                .await;
            match created {
                Ok(task) if task.column_id == ColumnId::new("in-progress") => {
                    let _ = self.tag_task(&task.id, "tag-bug").await;
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "demo seed failed"),
            }
        }
    }
}
