//! Property-based JSON round-trip tests for the API contract types.
//!
//! Uses proptest to verify:
//! 1. Any valid `Task` survives serialize → deserialize unchanged.
//! 2. Any valid request body survives the same round trip.
//! 3. Arbitrary input never causes a panic in deserialization (returns
//!    `Err` gracefully).

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;

use chrono::NaiveDate;
use taskboard_proto::api::{CreateTaskRequest, UpdateTaskRequest};
use taskboard_proto::task::{BoardId, ColumnId, Priority, Task, TaskId, UserId};

// --- Strategies for model types ---

/// Strategy for id-shaped strings (covers UUIDs and short literals).
fn arb_id_string() -> impl Strategy<Value = String> {
    "[a-z0-9-]{1,36}"
}

/// Strategy for arbitrary `Priority` values.
fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
        Just(Priority::Urgent),
    ]
}

/// Strategy for arbitrary dates across a wide year range.
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (1970i32..2200, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
}

/// Strategy for arbitrary `Task` values.
fn arb_task() -> impl Strategy<Value = Task> {
    (
        arb_id_string(),
        "[^\\x00]{1,64}",
        proptest::option::of("[^\\x00]{0,256}"),
        proptest::option::of(arb_priority()),
        proptest::option::of(arb_date()),
        any::<i64>(),
        arb_id_string(),
        arb_id_string(),
        proptest::option::of(arb_id_string()),
    )
        .prop_map(
            |(id, title, description, priority, due_date, order, board, column, assignee)| Task {
                id: TaskId::new(id),
                title,
                description,
                priority,
                due_date,
                order,
                board_id: BoardId::new(board),
                column_id: ColumnId::new(column),
                assignee_id: assignee.map(UserId::new),
            },
        )
}

/// Strategy for arbitrary `CreateTaskRequest` values.
fn arb_create_request() -> impl Strategy<Value = CreateTaskRequest> {
    arb_task().prop_map(|task| CreateTaskRequest {
        title: task.title,
        description: task.description,
        priority: task.priority,
        due_date: task.due_date,
        order: task.order,
        board_id: task.board_id,
        column_id: task.column_id,
        assignee_id: task.assignee_id,
    })
}

// --- Round-trip properties ---

proptest! {
    #[test]
    fn task_round_trips_through_json(task in arb_task()) {
        let json = serde_json::to_string(&task).expect("serialize");
        let back: Task = serde_json::from_str(&json).expect("deserialize");
        prop_assert_eq!(task, back);
    }

    #[test]
    fn create_request_round_trips_through_json(request in arb_create_request()) {
        let json = serde_json::to_string(&request).expect("serialize");
        let back: CreateTaskRequest = serde_json::from_str(&json).expect("deserialize");
        prop_assert_eq!(request, back);
    }

    #[test]
    fn update_request_round_trips_through_json(task in arb_task()) {
        let request = UpdateTaskRequest::from(&task);
        let json = serde_json::to_string(&request).expect("serialize");
        let back: UpdateTaskRequest = serde_json::from_str(&json).expect("deserialize");
        prop_assert_eq!(request, back);
    }

    #[test]
    fn update_request_never_serializes_null_assignee(task in arb_task()) {
        let request = UpdateTaskRequest::from(&task);
        let json = serde_json::to_value(&request).expect("serialize");
        if task.assignee_id.is_none() {
            prop_assert!(json.get("assigneeId").is_none());
        }
    }

    #[test]
    fn arbitrary_input_never_panics_deserialization(input in ".*") {
        // Malformed input must surface as Err, never a panic.
        let _ = serde_json::from_str::<Task>(&input);
        let _ = serde_json::from_str::<CreateTaskRequest>(&input);
    }
}
