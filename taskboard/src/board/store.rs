//! The optimistic task store.
//!
//! [`TaskStore`] owns the UI-authoritative task collection. Every
//! mutation runs synchronously under one lock, so a read immediately
//! after `move_task` always observes the optimistic state; only the
//! network call inside reconciliation suspends. The lock is never held
//! across an await.
//!
//! Snapshot discipline: the first unconfirmed mutation of a task
//! captures its pre-mutation state; further mutations while that
//! reconciliation is outstanding do NOT overwrite it, so rollback always
//! lands on the last server-confirmed state, not an intermediate one.
//!
//! Reconciliations for the same task are not serialized or fenced. Two
//! overlapping requests may resolve out of issue order and the last
//! response to land wins; the `syncing` flag is likewise process-wide
//! and cleared by whichever in-flight reconciliation finishes last.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use taskboard_proto::api::{CreateTaskRequest, TaskWithRefs, UpdateTaskRequest};
use taskboard_proto::task::{ColumnId, Task, TaskId};

use crate::api::{ApiError, TaskApi};

use super::{BoardEvent, DeleteOutcome, TaskChange, UpdateOutcome, apply_change};

/// Everything guarded by the store's single synchronous lock.
#[derive(Debug, Default)]
struct BoardState {
    /// The task collection. Element order is irrelevant; rendering uses
    /// each task's `column_id` and `order`.
    tasks: Vec<Task>,
    /// Pre-mutation snapshots, at most one per task id.
    snapshots: HashMap<TaskId, Task>,
    /// UI sync signal, not a concurrency gate.
    syncing: bool,
}

/// Shared state behind every clone of a [`TaskStore`] handle.
struct Inner<A: TaskApi> {
    api: A,
    state: Mutex<BoardState>,
    event_tx: mpsc::Sender<BoardEvent>,
}

/// Optimistic task store with rollback-on-failure reconciliation.
///
/// Constructed explicitly and handed to whatever drives it; there is no
/// global instance. The store is a cheap handle: clones share one
/// collection, so UI components and background reconciliations all
/// observe the same state. The generic parameter is the persistence
/// backend; tests inject a [`LoopbackApi`](crate::api::LoopbackApi).
pub struct TaskStore<A: TaskApi> {
    inner: Arc<Inner<A>>,
}

impl<A: TaskApi> Clone for TaskStore<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: TaskApi> TaskStore<A> {
    /// Creates a store over the given persistence backend.
    ///
    /// Returns the store and the receiver for [`BoardEvent`]s the UI
    /// layer should consume. Events are emitted best-effort: a full or
    /// dropped receiver never blocks or fails a store operation.
    pub fn new(api: A, event_buffer: usize) -> (Self, mpsc::Receiver<BoardEvent>) {
        let (event_tx, event_rx) = mpsc::channel(event_buffer);
        let store = Self {
            inner: Arc::new(Inner {
                api,
                state: Mutex::new(BoardState::default()),
                event_tx,
            }),
        };
        (store, event_rx)
    }

    fn emit(&self, event: BoardEvent) {
        let _ = self.inner.event_tx.try_send(event);
    }

    /// Replaces the collection wholesale. Used for initial load; pending
    /// snapshots are left untouched.
    pub fn replace_all(&self, tasks: Vec<Task>) {
        self.inner.state.lock().tasks = tasks;
    }

    /// Returns a copy of the current collection.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.inner.state.lock().tasks.clone()
    }

    /// Returns a copy of one task, if present.
    #[must_use]
    pub fn task(&self, task_id: &TaskId) -> Option<Task> {
        self.inner
            .state
            .lock()
            .tasks
            .iter()
            .find(|t| t.id == *task_id)
            .cloned()
    }

    /// Returns the tasks of one column in render order (ascending
    /// `order`; equal orders keep their collection order).
    #[must_use]
    pub fn column_tasks(&self, column_id: &ColumnId) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .inner
            .state
            .lock()
            .tasks
            .iter()
            .filter(|t| t.column_id == *column_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.order);
        tasks
    }

    /// Current value of the process-wide syncing signal.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.inner.state.lock().syncing
    }

    /// Whether a task has an unconfirmed mutation awaiting
    /// reconciliation.
    #[must_use]
    pub fn has_pending_update(&self, task_id: &TaskId) -> bool {
        self.inner.state.lock().snapshots.contains_key(task_id)
    }

    /// Applies field changes to a task immediately, capturing a rollback
    /// snapshot if this is the task's first unconfirmed mutation.
    ///
    /// Unknown ids are ignored ([`UpdateOutcome::Ignored`]), not errors.
    pub fn optimistic_update(&self, task_id: &TaskId, changes: Vec<TaskChange>) -> UpdateOutcome {
        let mut state = self.inner.state.lock();
        let Some(index) = state.tasks.iter().position(|t| t.id == *task_id) else {
            return UpdateOutcome::Ignored;
        };

        if !state.snapshots.contains_key(task_id) {
            let current = state.tasks[index].clone();
            state.snapshots.insert(task_id.clone(), current);
        }

        let task = &mut state.tasks[index];
        for change in changes {
            apply_change(task, change);
        }
        UpdateOutcome::Applied
    }

    /// Moves a task to a column position and kicks off reconciliation in
    /// the background.
    ///
    /// The column/order change is visible to readers before this returns;
    /// the network call runs in a detached task. UI callers ignore the
    /// returned [`JoinHandle`](tokio::task::JoinHandle); tests await it
    /// to observe the reconciliation outcome deterministically. Returns
    /// `None` for an unknown id (nothing to do, nothing spawned).
    ///
    /// Callers compute `target_order`, conventionally one past the
    /// highest order in the destination column.
    pub fn move_task(
        &self,
        task_id: &TaskId,
        target_column_id: ColumnId,
        target_order: i64,
    ) -> Option<tokio::task::JoinHandle<()>>
    where
        A: 'static,
    {
        let outcome = self.optimistic_update(
            task_id,
            vec![
                TaskChange::Column(target_column_id),
                TaskChange::Order(target_order),
            ],
        );
        match outcome {
            UpdateOutcome::Ignored => None,
            UpdateOutcome::Applied => {
                let store = self.clone();
                let task_id = task_id.clone();
                Some(tokio::spawn(async move {
                    store.reconcile(&task_id).await;
                }))
            }
        }
    }

    /// Pushes a task's full current field set to the server and settles
    /// its snapshot.
    ///
    /// Success discards the pending snapshot. Failure is absorbed here:
    /// the task rolls back to the snapshot (if one is pending) and the
    /// error goes no further than a log line. Unknown ids are a silent
    /// no-op. The response body is deliberately ignored, so overlapping
    /// reconciliations for the same task resolve last-response-wins.
    pub async fn reconcile(&self, task_id: &TaskId) {
        let request = {
            let mut state = self.inner.state.lock();
            let Some(task) = state.tasks.iter().find(|t| t.id == *task_id) else {
                return;
            };
            let request = UpdateTaskRequest::from(task);
            state.syncing = true;
            request
        };
        self.emit(BoardEvent::SyncingChanged { syncing: true });

        match self.inner.api.update_task(task_id, &request).await {
            Ok(_) => {
                let mut state = self.inner.state.lock();
                state.snapshots.remove(task_id);
                state.syncing = false;
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "reconciliation failed, rolling back");
                let mut state = self.inner.state.lock();
                if let Some(snapshot) = state.snapshots.remove(task_id) {
                    if let Some(slot) = state.tasks.iter_mut().find(|t| t.id == *task_id) {
                        *slot = snapshot;
                    }
                    state.syncing = false;
                    drop(state);
                    self.emit(BoardEvent::TaskReverted {
                        task_id: task_id.clone(),
                    });
                    self.emit(BoardEvent::SyncingChanged { syncing: false });
                    return;
                }
                // No snapshot to restore (should not occur): only clear
                // the signal.
                state.syncing = false;
            }
        }
        self.emit(BoardEvent::SyncingChanged { syncing: false });
    }

    /// Deletes a task optimistically.
    ///
    /// The removal itself is the optimistic action. There is no partial
    /// state to snapshot, so this bypasses the snapshot map and instead
    /// keeps the entire prior collection. On failure the whole
    /// collection is restored and the error is returned to the caller
    /// (a delete is typically awaited by a confirmation dialog that must
    /// react). Unknown ids return [`DeleteOutcome::Ignored`] without
    /// touching the syncing signal.
    ///
    /// # Errors
    ///
    /// Propagates the [`ApiError`] after rolling back.
    pub async fn delete_task(&self, task_id: &TaskId) -> Result<DeleteOutcome, ApiError> {
        let previous = {
            let mut state = self.inner.state.lock();
            if !state.tasks.iter().any(|t| t.id == *task_id) {
                return Ok(DeleteOutcome::Ignored);
            }
            let previous = state.tasks.clone();
            state.tasks.retain(|t| t.id != *task_id);
            state.syncing = true;
            previous
        };
        self.emit(BoardEvent::SyncingChanged { syncing: true });

        match self.inner.api.delete_task(task_id).await {
            Ok(()) => {
                self.inner.state.lock().syncing = false;
                self.emit(BoardEvent::SyncingChanged { syncing: false });
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "delete failed, restoring collection");
                {
                    let mut state = self.inner.state.lock();
                    state.tasks = previous;
                    state.syncing = false;
                }
                self.emit(BoardEvent::DeleteReverted {
                    task_id: task_id.clone(),
                });
                self.emit(BoardEvent::SyncingChanged { syncing: false });
                Err(e)
            }
        }
    }

    /// Creates a task through the server and appends it to the
    /// collection.
    ///
    /// Not optimistic: the server mints the id, so there is nothing
    /// local to mutate until it answers.
    ///
    /// # Errors
    ///
    /// Propagates the [`ApiError`]; the collection is untouched on
    /// failure.
    pub async fn create_task(&self, request: CreateTaskRequest) -> Result<Task, ApiError> {
        let created = self.inner.api.create_task(&request).await?.into_task();
        self.inner.state.lock().tasks.push(created.clone());
        Ok(created)
    }

    /// Reloads the full collection from the server, replacing local
    /// state. Returns the number of tasks loaded.
    ///
    /// # Errors
    ///
    /// Propagates the [`ApiError`]; local state is untouched on failure.
    pub async fn refresh(&self) -> Result<usize, ApiError> {
        let tasks: Vec<Task> = self
            .inner
            .api
            .list_tasks()
            .await?
            .into_iter()
            .map(TaskWithRefs::into_task)
            .collect();
        let count = tasks.len();
        self.replace_all(tasks);
        Ok(count)
    }
}
