//! Integration tests for the optimistic task store.
//!
//! Exercises the full optimistic-update / reconcile / rollback cycle
//! against the loopback persistence backend, plus the deliberate
//! unfenced behavior of overlapping reconciliations via a gated fake.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::similar_names)]

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};

use taskboard::api::{ApiError, LoopbackApi, TaskApi};
use taskboard::board::{BoardEvent, DeleteOutcome, TaskChange, TaskStore, UpdateOutcome};
use taskboard_proto::api::{CreateTaskRequest, TaskWithRefs, UpdateTaskRequest};
use taskboard_proto::task::{BoardId, ColumnId, Priority, Task, TaskId};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Creates a flat task in the given column.
fn make_task(id: &str, column: &str, order: i64) -> Task {
    Task {
        id: TaskId::new(id),
        title: format!("task {id}"),
        description: None,
        priority: None,
        due_date: None,
        order,
        board_id: BoardId::new("board-1"),
        column_id: ColumnId::new(column),
        assignee_id: None,
    }
}

/// Builds a store over a loopback backend, with both the client
/// collection and the backend seeded with the same tasks.
async fn make_synced_store(
    tasks: Vec<Task>,
) -> (TaskStore<LoopbackApi>, mpsc::Receiver<BoardEvent>) {
    let api = LoopbackApi::new();
    api.seed(tasks.clone()).await;
    let (store, events) = TaskStore::new(api, 32);
    store.replace_all(tasks);
    (store, events)
}

/// Takes the loopback backend offline so the next reconciliation fails.
async fn make_offline_store(
    tasks: Vec<Task>,
) -> (TaskStore<LoopbackApi>, mpsc::Receiver<BoardEvent>) {
    let api = LoopbackApi::new();
    api.seed(tasks.clone()).await;
    api.set_offline(true);
    let (store, events) = TaskStore::new(api, 32);
    store.replace_all(tasks);
    (store, events)
}

// ---------------------------------------------------------------------------
// Optimistic update + snapshot discipline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_merges_changes_over_prior_fields() {
    let (store, _events) = make_synced_store(vec![make_task("1", "todo", 1)]).await;
    let id = TaskId::new("1");

    let outcome = store.optimistic_update(
        &id,
        vec![
            TaskChange::Priority(Some(Priority::High)),
            TaskChange::Description(Some("urgent fix".to_string())),
        ],
    );
    assert_eq!(outcome, UpdateOutcome::Applied);

    let task = store.task(&id).unwrap();
    assert_eq!(task.priority, Some(Priority::High));
    assert_eq!(task.description, Some("urgent fix".to_string()));
    // Fields not named by the changes keep their prior values.
    assert_eq!(task.title, "task 1");
    assert_eq!(task.column_id, ColumnId::new("todo"));
}

#[tokio::test]
async fn reconcile_after_update_leaves_no_snapshot() {
    let (store, _events) = make_synced_store(vec![make_task("1", "todo", 1)]).await;
    let id = TaskId::new("1");

    let _ = store.optimistic_update(&id, vec![TaskChange::Order(7)]);
    assert!(store.has_pending_update(&id));

    store.reconcile(&id).await;
    assert!(!store.has_pending_update(&id));
    assert!(!store.is_syncing());
    assert_eq!(store.task(&id).unwrap().order, 7);
}

#[tokio::test]
async fn failed_reconcile_restores_exact_premutation_fields() {
    let (store, _events) = make_offline_store(vec![make_task("1", "todo", 1)]).await;
    let id = TaskId::new("1");
    let pristine = store.task(&id).unwrap();

    let _ = store.optimistic_update(
        &id,
        vec![
            TaskChange::Title("mutated".to_string()),
            TaskChange::Order(9),
            TaskChange::DueDate(chrono::NaiveDate::from_ymd_opt(2026, 9, 1)),
        ],
    );
    store.reconcile(&id).await;

    assert_eq!(store.task(&id).unwrap(), pristine);
    assert!(!store.has_pending_update(&id));
    assert!(!store.is_syncing());
}

#[tokio::test]
async fn two_updates_one_failed_reconcile_restore_both_fields() {
    let (store, _events) = make_offline_store(vec![make_task("1", "todo", 1)]).await;
    let id = TaskId::new("1");

    let _ = store.optimistic_update(&id, vec![TaskChange::Priority(Some(Priority::High))]);
    let _ = store.optimistic_update(&id, vec![TaskChange::Order(5)]);
    store.reconcile(&id).await;

    // Both edits revert to their values before the FIRST call, not to
    // the intermediate state.
    let task = store.task(&id).unwrap();
    assert_eq!(task.priority, None);
    assert_eq!(task.order, 1);
}

// ---------------------------------------------------------------------------
// Move scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn move_is_visible_before_the_network_resolves() {
    let (store, _events) = make_synced_store(vec![make_task("3", "in-progress", 1)]).await;
    let id = TaskId::new("3");

    let handle = store.move_task(&id, ColumnId::new("done"), 1).unwrap();

    // The reconciliation has not run yet (current-thread runtime), but
    // the optimistic state is already in place.
    let task = store.task(&id).unwrap();
    assert_eq!(task.column_id, ColumnId::new("done"));
    assert_eq!(task.order, 1);

    handle.await.unwrap();
    assert!(!store.has_pending_update(&id));
}

#[tokio::test]
async fn failed_move_snaps_back() {
    let (store, _events) = make_offline_store(vec![make_task("3", "in-progress", 1)]).await;
    let id = TaskId::new("3");

    let handle = store.move_task(&id, ColumnId::new("done"), 1).unwrap();
    assert_eq!(store.task(&id).unwrap().column_id, ColumnId::new("done"));

    handle.await.unwrap();

    let task = store.task(&id).unwrap();
    assert_eq!(task.column_id, ColumnId::new("in-progress"));
    assert_eq!(task.order, 1);
}

#[tokio::test]
async fn successful_move_persists_to_the_backend() {
    let api = LoopbackApi::new();
    api.seed(vec![make_task("3", "in-progress", 1)]).await;
    let (store, _events) = TaskStore::new(api, 32);
    store.replace_all(vec![make_task("3", "in-progress", 1)]);
    let id = TaskId::new("3");

    store
        .move_task(&id, ColumnId::new("done"), 2)
        .unwrap()
        .await
        .unwrap();

    // Loopback is consumed by the store, but refresh round-trips
    // through it and shows the persisted move.
    let count = store.refresh().await.unwrap();
    assert_eq!(count, 1);
    let task = store.task(&id).unwrap();
    assert_eq!(task.column_id, ColumnId::new("done"));
    assert_eq!(task.order, 2);
}

#[tokio::test]
async fn move_of_unknown_task_spawns_nothing() {
    let (store, _events) = make_synced_store(vec![make_task("1", "todo", 1)]).await;
    assert!(
        store
            .move_task(&TaskId::new("zz"), ColumnId::new("done"), 1)
            .is_none()
    );
    assert!(!store.is_syncing());
}

// ---------------------------------------------------------------------------
// Delete semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_delete_restores_entire_collection_and_rethrows() {
    let tasks = vec![
        make_task("1", "todo", 1),
        make_task("2", "todo", 2),
        make_task("3", "done", 1),
    ];
    let (store, _events) = make_offline_store(tasks.clone()).await;

    let err = store.delete_task(&TaskId::new("2")).await.unwrap_err();
    assert!(matches!(err, ApiError::Unavailable(_)));

    // The whole collection is back, other tasks included, same order.
    assert_eq!(store.tasks(), tasks);
    assert!(!store.is_syncing());
}

#[tokio::test]
async fn delete_of_unknown_id_is_a_noop() {
    let (store, _events) = make_synced_store(vec![make_task("1", "todo", 1)]).await;
    let before = store.tasks();

    let outcome = store.delete_task(&TaskId::new("zz")).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Ignored);
    assert_eq!(store.tasks(), before);
    assert!(!store.is_syncing());
}

#[tokio::test]
async fn successful_delete_removes_locally_and_remotely() {
    let (store, _events) = make_synced_store(vec![make_task("1", "todo", 1)]).await;
    let id = TaskId::new("1");

    let outcome = store.delete_task(&id).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(store.task(&id).is_none());
    assert_eq!(store.refresh().await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Board events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rollbacks_emit_events() {
    let (store, mut events) = make_offline_store(vec![make_task("1", "todo", 1)]).await;
    let id = TaskId::new("1");

    store
        .move_task(&id, ColumnId::new("done"), 1)
        .unwrap()
        .await
        .unwrap();
    let _ = store.delete_task(&id).await;

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(seen.contains(&BoardEvent::TaskReverted { task_id: id.clone() }));
    assert!(seen.contains(&BoardEvent::DeleteReverted { task_id: id.clone() }));
    assert!(seen.contains(&BoardEvent::SyncingChanged { syncing: true }));
    assert!(seen.contains(&BoardEvent::SyncingChanged { syncing: false }));
}

// ---------------------------------------------------------------------------
// Overlapping reconciliations (deliberately unfenced)
// ---------------------------------------------------------------------------

/// A [`TaskApi`] whose update responses are held back until the test
/// releases them, keyed by the request's `order` value. Lets a test pin
/// the resolution order of overlapping reconciliations.
#[derive(Clone)]
struct GatedApi {
    gates: Arc<Mutex<HashMap<i64, oneshot::Receiver<Result<TaskWithRefs, ApiError>>>>>,
    started_tx: mpsc::UnboundedSender<i64>,
}

impl GatedApi {
    fn new() -> (Self, mpsc::UnboundedReceiver<i64>) {
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        (
            Self {
                gates: Arc::new(Mutex::new(HashMap::new())),
                started_tx,
            },
            started_rx,
        )
    }

    /// Registers a gate for the update carrying this `order`. The
    /// returned sender releases the response.
    async fn gate(&self, order: i64) -> oneshot::Sender<Result<TaskWithRefs, ApiError>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().await.insert(order, rx);
        tx
    }
}

impl TaskApi for GatedApi {
    async fn list_tasks(&self) -> Result<Vec<TaskWithRefs>, ApiError> {
        Ok(Vec::new())
    }

    async fn create_task(&self, _request: &CreateTaskRequest) -> Result<TaskWithRefs, ApiError> {
        Err(ApiError::Unavailable("gated api cannot create".to_string()))
    }

    async fn update_task(
        &self,
        _task_id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> Result<TaskWithRefs, ApiError> {
        let gate = self
            .gates
            .lock()
            .await
            .remove(&request.order)
            .expect("no gate registered for this update");
        let _ = self.started_tx.send(request.order);
        match gate.await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Unavailable("gate dropped".to_string())),
        }
    }

    async fn delete_task(&self, _task_id: &TaskId) -> Result<(), ApiError> {
        Ok(())
    }
}

#[tokio::test]
async fn overlapping_reconciliations_resolve_last_response_wins() {
    let (api, mut started_rx) = GatedApi::new();
    let release_first = api.gate(10).await;
    let release_second = api.gate(20).await;

    let (store, _events) = TaskStore::new(api, 32);
    store.replace_all(vec![make_task("1", "in-progress", 1)]);
    let id = TaskId::new("1");

    // First move: reconciliation A goes out carrying order 10.
    let handle_a = store.move_task(&id, ColumnId::new("review"), 10).unwrap();
    assert_eq!(started_rx.recv().await, Some(10));

    // Second move before A resolves: the snapshot from before A is kept,
    // and reconciliation B goes out carrying order 20.
    let handle_b = store.move_task(&id, ColumnId::new("done"), 20).unwrap();
    assert_eq!(started_rx.recv().await, Some(20));
    assert!(store.is_syncing());

    // B's response lands first and settles the (single) snapshot.
    release_second
        .send(Ok(LoopbackApi::expand(make_task("1", "done", 20))))
        .ok()
        .expect("release B");
    handle_b.await.unwrap();
    assert!(!store.has_pending_update(&id));

    // A then fails. There is no snapshot left to restore, so the store
    // only clears the syncing signal; the optimistic state stands and
    // the later response has won regardless of issue order.
    release_first
        .send(Err(ApiError::Unavailable("stale request".to_string())))
        .ok()
        .expect("release A");
    handle_a.await.unwrap();

    let task = store.task(&id).unwrap();
    assert_eq!(task.column_id, ColumnId::new("done"));
    assert_eq!(task.order, 20);
    assert!(!store.is_syncing());
}

#[tokio::test]
async fn syncing_is_cleared_by_whichever_reconciliation_finishes_last() {
    let (api, mut started_rx) = GatedApi::new();
    let release_first = api.gate(10).await;
    let release_second = api.gate(20).await;

    let (store, _events) = TaskStore::new(api, 32);
    store.replace_all(vec![make_task("1", "todo", 1), make_task("2", "todo", 2)]);

    let handle_a = store
        .move_task(&TaskId::new("1"), ColumnId::new("done"), 10)
        .unwrap();
    let handle_b = store
        .move_task(&TaskId::new("2"), ColumnId::new("done"), 20)
        .unwrap();
    assert_eq!(started_rx.recv().await, Some(10));
    assert_eq!(started_rx.recv().await, Some(20));

    // The first completion clears the flag even though another
    // reconciliation is still in flight: the signal means "one just
    // finished", not "all done".
    release_first
        .send(Ok(LoopbackApi::expand(make_task("1", "done", 10))))
        .ok()
        .expect("release A");
    handle_a.await.unwrap();
    assert!(!store.is_syncing());

    release_second
        .send(Ok(LoopbackApi::expand(make_task("2", "done", 20))))
        .ok()
        .expect("release B");
    handle_b.await.unwrap();
    assert!(!store.is_syncing());
}
