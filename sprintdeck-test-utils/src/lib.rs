//! Sprintdeck Test Utilities
//!
//! Shared test infrastructure for the sprintdeck workspace:
//! - Proptest generators for descriptors, records and workflow inputs
//! - Fixtures: seeded in-memory stores, manual clocks, configs
//! - Assertions for results, outcomes and store call logs

// Re-export the in-memory store from its source crate
pub use sprintdeck_storage::{CallKind, MemoryStore, StoreCall};

// Re-export core types for convenience
pub use sprintdeck_core::{
    DeckConfig, DeckError, DeckResult, FieldErrors, FilterClause, FilterOperator, FilterValue,
    GuardConfig, Identifier, ManualClock, Record, SprintForm, SprintStatus, StoreError, Timestamp,
};
pub use sprintdeck_workflow::{BoardColumns, BoardMove, MoveOutcome, SubmitOutcome};

use serde_json::{json, Value};

/// Convert a JSON object literal into a [`Record`]. Non-objects give an
/// empty record.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for sprintdeck types.

    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    /// Board statuses used by the default config.
    pub const BOARD_STATUSES: [&str; 4] = ["todo", "in_progress", "review", "done"];

    pub fn arb_identifier() -> impl Strategy<Value = Identifier> {
        prop_oneof![
            (1i64..10_000).prop_map(Identifier::Int),
            "[a-z0-9]{8}".prop_map(Identifier::Text),
        ]
    }

    pub fn arb_sprint_status() -> impl Strategy<Value = SprintStatus> {
        prop::sample::select(SprintStatus::ALL.to_vec())
    }

    pub fn arb_filter_operator() -> impl Strategy<Value = FilterOperator> {
        prop::sample::select(FilterOperator::ALL.to_vec())
    }

    /// Scalar filter operands: small ints and short lowercase strings.
    pub fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            (-5i64..20).prop_map(Value::from),
            "[a-d]{1,3}".prop_map(Value::from),
        ]
    }

    /// A clause on one of `columns` with any operator. Membership clauses
    /// carry a short list.
    pub fn arb_filter_clause(columns: &'static [&'static str]) -> impl Strategy<Value = FilterClause> {
        (
            prop::sample::select(columns.to_vec()),
            arb_filter_operator(),
            arb_scalar(),
            prop::collection::vec(arb_scalar(), 1..4),
        )
            .prop_map(|(column, operator, scalar, list)| {
                let value = if operator.expects_list() {
                    FilterValue::List(list)
                } else {
                    FilterValue::Scalar(scalar)
                };
                match FilterClause::new(column, operator, value) {
                    Ok(clause) => clause,
                    Err(_) => FilterClause::eq(column, Value::Null),
                }
            })
    }

    pub fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..730).prop_map(|offset| {
            let base = NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid base date");
            base + chrono::Duration::days(offset)
        })
    }

    /// A new-sprint form that passes validation.
    pub fn arb_valid_sprint_form() -> impl Strategy<Value = SprintForm> {
        ("[A-Z][a-z]{2,10} [0-9]{1,2}", arb_date(), 0i64..60, 1i64..50, arb_sprint_status())
            .prop_map(|(name, start, length, project, status)| {
                SprintForm::new(name)
                    .with_dates(start, start + chrono::Duration::days(length))
                    .with_project(project)
                    .with_status(status)
            })
    }

    /// Task rows with sequential ids and board statuses.
    pub fn arb_task_rows(max: usize) -> impl Strategy<Value = Vec<Record>> {
        prop::collection::vec(
            (prop::sample::select(BOARD_STATUSES.to_vec()), 0u32..13),
            0..max,
        )
        .prop_map(|tasks| {
            tasks
                .into_iter()
                .enumerate()
                .map(|(i, (status, points))| {
                    record(json!({
                        "id": i as i64 + 1,
                        "title": format!("Task {}", i + 1),
                        "status": status,
                        "story_points": points,
                    }))
                })
                .collect()
        })
    }

    pub fn arb_guard_config() -> impl Strategy<Value = GuardConfig> {
        (1u64..2_000, 1u64..20_000).prop_map(|(window_ms, extra)| GuardConfig {
            window_ms,
            safety_timeout_ms: window_ms + extra,
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::Arc;

    pub const PROJECT_COLUMNS: [&str; 2] = ["name", "owner"];
    pub const SPRINT_COLUMNS: [&str; 11] = [
        "name",
        "goal",
        "status",
        "start_date",
        "end_date",
        "project_id",
        "progress",
        "tasks_completed",
        "tasks_total",
        "story_points",
        "created_at",
    ];
    pub const TASK_COLUMNS: [&str; 6] =
        ["title", "status", "story_points", "sprint_id", "assignee", "priority"];

    /// Session-open instant used by every timing scenario.
    pub fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    pub fn manual_clock() -> Arc<ManualClock> {
        ManualClock::shared(t0())
    }

    pub fn test_config() -> DeckConfig {
        DeckConfig::default()
    }

    pub fn day(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).expect("valid fixture date")
    }

    /// Store with the dashboard tables declared and no rows.
    pub fn empty_store() -> Arc<MemoryStore> {
        Arc::new(
            MemoryStore::new()
                .with_table("projects", PROJECT_COLUMNS)
                .with_table("sprints", SPRINT_COLUMNS)
                .with_table("tasks", TASK_COLUMNS)
                .with_relation("sprints", "projects", "projects", "project_id")
                .with_relation("tasks", "sprints", "sprints", "sprint_id"),
        )
    }

    /// Store with one project, a planned and an active sprint, and five
    /// tasks spread over the board.
    pub fn seeded_store() -> Arc<MemoryStore> {
        let store = empty_store();
        store
            .seed("projects", [record(json!({"name": "Dashboard", "owner": "ops"}))])
            .and_then(|_| {
                store.seed(
                    "sprints",
                    [
                        record(json!({
                            "name": "Sprint 1", "status": "active", "project_id": 1,
                            "start_date": "2026-03-02", "end_date": "2026-03-13",
                        })),
                        record(json!({
                            "name": "Sprint 2", "status": "planned", "project_id": 1,
                            "start_date": "2026-03-16", "end_date": "2026-03-27",
                        })),
                    ],
                )
            })
            .and_then(|_| store.seed("tasks", task_rows()))
            .expect("fixture seed");
        store
    }

    /// The five tasks loaded by [`seeded_store`], ids 1 to 5.
    pub fn task_rows() -> Vec<Record> {
        [
            ("Login form", "todo", 3, 1),
            ("Sprint burndown", "todo", 5, 1),
            ("Board drag", "in_progress", 8, 1),
            ("Filter bar", "review", 2, 1),
            ("Team page", "done", 1, 2),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (title, status, points, sprint))| {
            record(json!({
                "id": i as i64 + 1,
                "title": title,
                "status": status,
                "story_points": points,
                "sprint_id": sprint,
            }))
        })
        .collect()
    }

    /// A new-sprint form that passes validation.
    pub fn valid_sprint_form() -> SprintForm {
        SprintForm::new("Sprint 3")
            .with_goal("Ship the board")
            .with_dates(day(3, 30), day(4, 10))
            .with_project(1)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for sprintdeck-specific outcomes.

    use super::*;

    /// Assert that a DeckResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &DeckResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a DeckResult is Err.
    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &DeckResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {:?}", result);
    }

    /// Assert that a DeckResult failed on the store side.
    #[track_caller]
    pub fn assert_store_error<T: std::fmt::Debug>(result: &DeckResult<T>) {
        match result {
            Err(DeckError::Store(_)) => {}
            other => panic!("Expected Store error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_cancelled<T: std::fmt::Debug>(result: &DeckResult<T>) {
        match result {
            Err(err) if err.is_cancelled() => {}
            other => panic!("Expected Cancelled, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_field_error(errors: &FieldErrors, field: &str) {
        assert!(
            errors.contains(field),
            "Expected an error on '{}', got: {}",
            field,
            errors
        );
    }

    /// Assert a submit committed and return the stored row.
    #[track_caller]
    pub fn assert_committed(outcome: &SubmitOutcome) -> &Record {
        match outcome {
            SubmitOutcome::Committed(row) => row,
            other => panic!("Expected Committed, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_rejected(outcome: &SubmitOutcome) {
        assert!(
            matches!(outcome, SubmitOutcome::Rejected(_)),
            "Expected Rejected, got: {:?}",
            outcome
        );
    }

    /// Assert the store received exactly `expected` statements of `kind`
    /// against `resource`.
    #[track_caller]
    pub fn assert_call_count(store: &MemoryStore, kind: CallKind, resource: &str, expected: usize) {
        let calls = store.calls_to(kind, resource);
        assert_eq!(
            calls.len(),
            expected,
            "Expected {} {:?} call(s) to {}, got: {:?}",
            expected,
            kind,
            resource,
            calls
        );
    }

    #[track_caller]
    pub fn assert_no_calls(store: &MemoryStore) {
        let calls = store.calls();
        assert!(calls.is_empty(), "Expected no store calls, got: {:?}", calls);
    }

    /// Assert every item sits in exactly one column.
    #[track_caller]
    pub fn assert_partition(board: &BoardColumns, expected: &[Identifier]) {
        let mut held: Vec<&Identifier> = board
            .columns()
            .iter()
            .flat_map(|c| c.items.iter())
            .collect();
        held.sort();
        let mut wanted: Vec<&Identifier> = expected.iter().collect();
        wanted.sort();
        assert_eq!(held, wanted, "Board is not a partition of the expected items");
    }
}
