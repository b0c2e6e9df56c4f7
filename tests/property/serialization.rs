// Test-specific lint overrides: property tests use unwrap freely.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::missing_docs_in_private_items
)]

//! Property-based serialization tests for the board-channel wire format.
//!
//! Uses proptest to verify:
//! 1. Any `ServerEvent` survives encode → decode round-trip.
//! 2. Any `ClientCommand` survives encode → decode round-trip.
//! 3. Arbitrary input never causes a panic in `decode_event` (it returns
//!    `Ok`/`Err` gracefully).
//! 4. Well-formed frames with an unrecognized `type` are ignored, not
//!    errors.
//! 5. `Task` resources survive a JSON round-trip.

use proptest::prelude::*;

use termboard_proto::board::BoardId;
use termboard_proto::sync::{
    ClientCommand, ServerEvent, decode_command, decode_event, encode_command,
};
use termboard_proto::task::{Priority, Task, TaskId, TaskStatus};

// --- Strategies for protocol types ---

/// Strategy for generating arbitrary `TaskStatus` values.
fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Todo),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Review),
        Just(TaskStatus::Done),
    ]
}

/// Strategy for generating arbitrary `TaskId` values.
fn arb_task_id() -> impl Strategy<Value = TaskId> {
    any::<i64>().prop_map(TaskId::new)
}

/// Strategy for generating arbitrary `Priority` values (1–4).
fn arb_priority() -> impl Strategy<Value = Priority> {
    (1u8..=4).prop_map(|p| Priority::new(p).unwrap())
}

/// Strategy for generating arbitrary due timestamps (post-epoch, sane range).
fn arb_due() -> impl Strategy<Value = Option<chrono::DateTime<chrono::Utc>>> {
    prop::option::of((0i64..4_102_444_800).prop_map(|secs| {
        chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0).unwrap()
    }))
}

/// Strategy for generating arbitrary `Task` resources.
fn arb_task() -> impl Strategy<Value = Task> {
    (
        arb_task_id(),
        "[^\\x00]{1,64}",
        prop::option::of("[^\\x00]{0,128}"),
        arb_status(),
        arb_priority(),
        arb_due(),
        any::<i64>(),
    )
        .prop_map(
            |(id, title, description, status, priority, due_date, board)| Task {
                id,
                title,
                description,
                status,
                priority,
                due_date,
                board: BoardId::new(board),
            },
        )
}

proptest! {
    #[test]
    fn server_event_round_trips(task_id in arb_task_id(), status in arb_status()) {
        let event = ServerEvent::TaskUpdate { task_id, status };
        let text = serde_json::to_string(&event).unwrap();
        let decoded = decode_event(&text).unwrap();
        prop_assert_eq!(decoded, Some(event));
    }

    #[test]
    fn client_command_round_trips(task_id in arb_task_id(), status in arb_status()) {
        let command = ClientCommand::UpdateStatus { task_id, status };
        let text = encode_command(&command).unwrap();
        let decoded = decode_command(&text).unwrap();
        prop_assert_eq!(decoded, command);
    }

    #[test]
    fn decode_event_never_panics_on_arbitrary_input(input in "\\PC*") {
        // Any outcome is acceptable; reaching here without panicking is
        // the property.
        let _ = decode_event(&input);
    }

    #[test]
    fn decode_event_never_panics_on_arbitrary_bytes_as_string(
        bytes in prop::collection::vec(any::<u8>(), 0..256)
    ) {
        let input = String::from_utf8_lossy(&bytes);
        let _ = decode_event(&input);
    }

    #[test]
    fn unknown_types_are_ignored_not_errors(kind in "[a-z_]{1,24}", task_id in any::<i64>()) {
        prop_assume!(kind != "task_update");
        let text = format!(r#"{{"type": "{kind}", "task_id": {task_id}}}"#);
        let decoded = decode_event(&text).unwrap();
        prop_assert_eq!(decoded, None);
    }

    #[test]
    fn task_resource_round_trips(task in arb_task()) {
        let json = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(decoded, task);
    }

    #[test]
    fn status_wire_strings_are_screaming_snake_case(status in arb_status()) {
        let json = serde_json::to_string(&status).unwrap();
        let expected = match status {
            TaskStatus::Todo => "\"TODO\"",
            TaskStatus::InProgress => "\"IN_PROGRESS\"",
            TaskStatus::Review => "\"REVIEW\"",
            TaskStatus::Done => "\"DONE\"",
        };
        prop_assert_eq!(json, expected);
    }
}
