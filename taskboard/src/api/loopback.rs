//! Loopback persistence API for testing.
//!
//! [`LoopbackApi`] keeps tasks in an in-process map and mirrors the real
//! server's semantics (404 on unknown ids, `MEDIUM` priority default on
//! create, full-record update). An offline switch makes every request
//! fail with [`ApiError::Unavailable`], which is how tests drive the
//! store's rollback paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use taskboard_proto::api::{BoardRef, ColumnRef, CreateTaskRequest, TaskWithRefs, UpdateTaskRequest};
use taskboard_proto::task::{Priority, Task, TaskId};

use super::{ApiError, TaskApi};

/// In-process [`TaskApi`] implementation with failure injection.
#[derive(Debug, Default)]
pub struct LoopbackApi {
    tasks: RwLock<HashMap<TaskId, TaskWithRefs>>,
    offline: AtomicBool,
}

impl LoopbackApi {
    /// Creates an empty loopback API in the online state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expands a flat task into the server response shape, synthesizing
    /// board/column titles from their ids. Unset priorities become
    /// `MEDIUM`, as they would after a round trip through the server.
    #[must_use]
    pub fn expand(task: Task) -> TaskWithRefs {
        TaskWithRefs {
            id: task.id,
            title: task.title,
            description: task.description,
            priority: task.priority.unwrap_or(Priority::Medium),
            due_date: task.due_date,
            order: task.order,
            board_id: task.board_id.clone(),
            column_id: task.column_id.clone(),
            assignee_id: task.assignee_id,
            board: BoardRef {
                id: task.board_id.clone(),
                title: task.board_id.to_string(),
            },
            column: ColumnRef {
                id: task.column_id.clone(),
                title: task.column_id.to_string(),
            },
            assignee: None,
            tags: Vec::new(),
        }
    }

    /// Seeds the backend with flat tasks.
    pub async fn seed(&self, tasks: impl IntoIterator<Item = Task>) {
        let mut map = self.tasks.write().await;
        for task in tasks {
            let expanded = Self::expand(task);
            map.insert(expanded.id.clone(), expanded);
        }
    }

    /// Switches every subsequent request between failing and succeeding.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns the stored record for a task, for test assertions.
    pub async fn stored(&self, task_id: &TaskId) -> Option<TaskWithRefs> {
        self.tasks.read().await.get(task_id).cloned()
    }

    fn check_online(&self) -> Result<(), ApiError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Unavailable("loopback is offline".to_string()));
        }
        Ok(())
    }
}

impl TaskApi for LoopbackApi {
    async fn list_tasks(&self) -> Result<Vec<TaskWithRefs>, ApiError> {
        self.check_online()?;
        let map = self.tasks.read().await;
        let mut tasks: Vec<TaskWithRefs> = map.values().cloned().collect();
        tasks.sort_by_key(|t| t.order);
        Ok(tasks)
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<TaskWithRefs, ApiError> {
        self.check_online()?;
        let task = Self::expand(Task {
            id: TaskId::generate(),
            title: request.title.clone(),
            description: request.description.clone(),
            priority: request.priority,
            due_date: request.due_date,
            order: request.order,
            board_id: request.board_id.clone(),
            column_id: request.column_id.clone(),
            assignee_id: request.assignee_id.clone(),
        });
        self.tasks
            .write()
            .await
            .insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        task_id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> Result<TaskWithRefs, ApiError> {
        self.check_online()?;
        let mut map = self.tasks.write().await;
        let Some(stored) = map.get_mut(task_id) else {
            return Err(ApiError::Status { status: 404 });
        };

        stored.title = request.title.clone();
        stored.description = request.description.clone();
        if let Some(priority) = request.priority {
            stored.priority = priority;
        }
        stored.due_date = request.due_date;
        stored.order = request.order;
        stored.column_id = request.column_id.clone();
        stored.column = ColumnRef {
            id: request.column_id.clone(),
            title: request.column_id.to_string(),
        };
        stored.assignee_id = request.assignee_id.clone();
        Ok(stored.clone())
    }

    async fn delete_task(&self, task_id: &TaskId) -> Result<(), ApiError> {
        self.check_online()?;
        let mut map = self.tasks.write().await;
        map.remove(task_id)
            .map(|_| ())
            .ok_or(ApiError::Status { status: 404 })
    }
}
