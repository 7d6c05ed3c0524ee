//! Sprint progress rollups derived from task rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sprintdeck_core::{DeckResult, FilterClause, Identifier, Record};
use sprintdeck_storage::{FetchGateway, MutationGateway};
use tracing::debug;

/// Column on a task row naming its sprint.
pub const SPRINT_REF_FIELD: &str = "sprint_id";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintAggregates {
    pub tasks_total: u32,
    pub tasks_completed: u32,
    pub story_points: u32,
    /// Completed share of tasks, 0..=100, rounded to nearest.
    pub progress: u8,
}

impl SprintAggregates {
    /// Fold task rows. A task counts as completed when its `status`
    /// equals `done_status`; missing or non-numeric points count as zero.
    pub fn from_tasks(tasks: &[Record], done_status: &str) -> Self {
        let mut totals = Self::default();
        for task in tasks {
            totals.tasks_total += 1;
            if task.get("status").and_then(Value::as_str) == Some(done_status) {
                totals.tasks_completed += 1;
            }
            let points = task
                .get("story_points")
                .and_then(Value::as_u64)
                .and_then(|p| u32::try_from(p).ok())
                .unwrap_or(0);
            totals.story_points = totals.story_points.saturating_add(points);
        }
        totals.progress = match totals.tasks_total {
            0 => 0,
            total => {
                let pct = (u64::from(totals.tasks_completed) * 100 + u64::from(total) / 2)
                    / u64::from(total);
                u8::try_from(pct).unwrap_or(100)
            }
        };
        totals
    }

    pub fn to_payload(&self) -> Record {
        let mut payload = Record::new();
        payload.insert("tasks_total".to_string(), Value::from(self.tasks_total));
        payload.insert("tasks_completed".to_string(), Value::from(self.tasks_completed));
        payload.insert("story_points".to_string(), Value::from(self.story_points));
        payload.insert("progress".to_string(), Value::from(self.progress));
        payload
    }
}

/// Re-read a sprint's tasks and write the rollup back onto the sprint.
///
/// Two separate statements; a task change landing between them is not
/// reflected until the next recompute.
pub async fn recompute_sprint_aggregates(
    tasks: &FetchGateway,
    sprints: &MutationGateway,
    sprint_id: &Identifier,
    done_status: &str,
) -> DeckResult<SprintAggregates> {
    let descriptor = tasks
        .query()
        .filter(FilterClause::eq(SPRINT_REF_FIELD, sprint_id.to_value()));
    let rows = tasks.try_fetch_all(&descriptor).await?;
    let aggregates = SprintAggregates::from_tasks(&rows, done_status);
    debug!(sprint = %sprint_id, ?aggregates, "Recomputed sprint aggregates");

    sprints.try_update(sprint_id, aggregates.to_payload()).await?;
    Ok(aggregates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sprintdeck_core::{DeckError, StoreError};
    use sprintdeck_storage::{CallKind, MemoryStore};
    use std::sync::Arc;

    fn rows(values: &[Value]) -> Vec<Record> {
        values.iter().filter_map(|v| v.as_object().cloned()).collect()
    }

    #[test]
    fn test_empty_sprint_has_zero_progress() {
        assert_eq!(SprintAggregates::from_tasks(&[], "done"), SprintAggregates::default());
    }

    #[test]
    fn test_progress_rounds_to_nearest() {
        let tasks = rows(&[
            json!({"status": "done", "story_points": 3}),
            json!({"status": "todo", "story_points": 5}),
            json!({"status": "review", "story_points": null}),
        ]);
        let aggregates = SprintAggregates::from_tasks(&tasks, "done");
        assert_eq!(aggregates.tasks_total, 3);
        assert_eq!(aggregates.tasks_completed, 1);
        assert_eq!(aggregates.story_points, 8);
        assert_eq!(aggregates.progress, 33);

        let two_of_three = SprintAggregates::from_tasks(
            &rows(&[json!({"status": "done"}), json!({"status": "done"}), json!({})]),
            "done",
        );
        assert_eq!(two_of_three.progress, 67);
    }

    #[test]
    fn test_done_status_is_configurable() {
        let tasks = rows(&[json!({"status": "closed"}), json!({"status": "done"})]);
        assert_eq!(SprintAggregates::from_tasks(&tasks, "closed").tasks_completed, 1);
    }

    fn store() -> Arc<MemoryStore> {
        let store = MemoryStore::new()
            .with_table("sprints", ["name", "tasks_total", "tasks_completed", "story_points", "progress"])
            .with_table("tasks", ["title", "status", "story_points", "sprint_id"]);
        store
            .seed("sprints", rows(&[json!({"name": "S1"}), json!({"name": "S2"})]))
            .unwrap();
        store
            .seed(
                "tasks",
                rows(&[
                    json!({"title": "a", "status": "done", "story_points": 2, "sprint_id": 1}),
                    json!({"title": "b", "status": "todo", "story_points": 3, "sprint_id": 1}),
                    json!({"title": "c", "status": "done", "story_points": 8, "sprint_id": 2}),
                ]),
            )
            .unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_recompute_writes_rollup_to_sprint() {
        let store = store();
        let tasks = FetchGateway::new(store.clone(), "tasks");
        let sprints = MutationGateway::new(store.clone(), "sprints");

        let aggregates = recompute_sprint_aggregates(&tasks, &sprints, &Identifier::Int(1), "done")
            .await
            .unwrap();
        assert_eq!(aggregates.progress, 50);
        assert_eq!(aggregates.story_points, 5);

        let sprint = store.row("sprints", &Identifier::Int(1)).unwrap();
        assert_eq!(sprint["tasks_total"], json!(2));
        assert_eq!(sprint["progress"], json!(50));
        assert!(store.row("sprints", &Identifier::Int(2)).unwrap()["progress"].is_null());
    }

    #[tokio::test]
    async fn test_failed_read_skips_write() {
        let store = store();
        store.fail_next("tasks", StoreError::transport("tasks", "reset"));
        let tasks = FetchGateway::new(store.clone(), "tasks");
        let sprints = MutationGateway::new(store.clone(), "sprints");

        let err = recompute_sprint_aggregates(&tasks, &sprints, &Identifier::Int(1), "done")
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::Store(StoreError::Transport { .. })));
        assert_eq!(store.call_count(CallKind::Update), 0);
    }
}
