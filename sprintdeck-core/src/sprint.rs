//! Sprint records and the form model edited by a sprint dialog

use crate::enums::SprintStatus;
use crate::error::StoreError;
use crate::identity::{Identifier, Record};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// SPRINT ENTITY
// ============================================================================

/// Persisted sprint row.
///
/// Aggregate columns are maintained by recompute passes and default to
/// zero when a row predates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintEntity {
    pub id: Identifier,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: SprintStatus,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub project_id: Option<Identifier>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks_completed: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks_total: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub story_points: u32,
}

/// Stores fill columns a row never set with null.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl SprintEntity {
    /// Decode a row that `resource` returned.
    pub fn from_record(resource: &str, record: &Record) -> Result<Self, StoreError> {
        serde_json::from_value(Value::Object(record.clone())).map_err(|e| StoreError::Decode {
            resource: resource.to_string(),
            reason: e.to_string(),
        })
    }

    /// Open this sprint in an edit form.
    pub fn to_form(&self) -> SprintForm {
        SprintForm {
            id: Some(self.id.clone()),
            name: self.name.clone(),
            goal: self.goal.clone(),
            status: self.status,
            original_status: Some(self.status),
            start_date: self.start_date,
            end_date: self.end_date,
            project_id: self.project_id.clone(),
        }
    }
}

// ============================================================================
// SPRINT FORM
// ============================================================================

/// Fields of the sprint form that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SprintField {
    Name,
    StartDate,
    EndDate,
    ProjectId,
    Status,
}

impl SprintField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SprintField::Name => "name",
            SprintField::StartDate => "start_date",
            SprintField::EndDate => "end_date",
            SprintField::ProjectId => "project_id",
            SprintField::Status => "status",
        }
    }
}

impl fmt::Display for SprintField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sprint data as held by an open form.
///
/// `original_status` is the status the sprint had when the form opened;
/// it is `None` for a sprint that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SprintForm {
    #[serde(default)]
    pub id: Option<Identifier>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub status: SprintStatus,
    #[serde(default)]
    pub original_status: Option<SprintStatus>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub project_id: Option<Identifier>,
}

impl SprintForm {
    /// Blank form for a new sprint.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Form for an existing sprint whose stored status is `original`.
    pub fn edit(id: impl Into<Identifier>, original: SprintStatus) -> Self {
        Self {
            id: Some(id.into()),
            status: original,
            original_status: Some(original),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    pub fn with_status(mut self, status: SprintStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn with_start_date(mut self, start: NaiveDate) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn with_end_date(mut self, end: NaiveDate) -> Self {
        self.end_date = Some(end);
        self
    }

    pub fn with_project(mut self, project_id: impl Into<Identifier>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Columns written by a create or update.
    ///
    /// The identifier and `original_status` are form bookkeeping and are
    /// never part of the payload.
    pub fn to_payload(&self) -> Record {
        let mut payload = Record::new();
        payload.insert("name".to_string(), Value::String(self.name.trim().to_string()));
        payload.insert(
            "goal".to_string(),
            self.goal.clone().map(Value::String).unwrap_or(Value::Null),
        );
        payload.insert(
            "status".to_string(),
            Value::String(self.status.as_db_str().to_string()),
        );
        payload.insert("start_date".to_string(), date_value(self.start_date));
        payload.insert("end_date".to_string(), date_value(self.end_date));
        payload.insert(
            "project_id".to_string(),
            self.project_id
                .as_ref()
                .map(Identifier::to_value)
                .unwrap_or(Value::Null),
        );
        payload
    }
}

fn date_value(date: Option<NaiveDate>) -> Value {
    date.map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_entity_from_record_defaults_aggregates() {
        let record = json!({
            "id": 3,
            "name": "Sprint 3",
            "status": "active",
            "start_date": "2026-01-05",
            "end_date": "2026-01-19",
            "project_id": 1
        });
        let entity = SprintEntity::from_record("sprints", record.as_object().unwrap()).unwrap();
        assert_eq!(entity.id, Identifier::Int(3));
        assert_eq!(entity.status, SprintStatus::Active);
        assert_eq!(entity.start_date, Some(day(2026, 1, 5)));
        assert_eq!(entity.tasks_total, 0);
        assert_eq!(entity.progress, 0);
    }

    #[test]
    fn test_entity_from_record_accepts_null_aggregates() {
        let record = json!({
            "id": 4,
            "name": "Sprint 4",
            "status": null,
            "progress": null,
            "tasks_total": null,
            "goal": null
        });
        let entity = SprintEntity::from_record("sprints", record.as_object().unwrap()).unwrap();
        assert_eq!(entity.status, SprintStatus::Planned);
        assert_eq!(entity.progress, 0);
        assert_eq!(entity.goal, None);
    }

    #[test]
    fn test_entity_from_malformed_record_is_decode_error() {
        let record = json!({"id": 5, "name": "Sprint 5", "status": "archived"});
        let err = SprintEntity::from_record("sprints", record.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, StoreError::Decode { ref resource, .. } if resource == "sprints"));

        let record = json!({"name": "No id"});
        assert!(SprintEntity::from_record("sprints", record.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_entity_to_form_keeps_original_status() {
        let record = json!({"id": "s-1", "name": "Alpha", "status": "completed"});
        let entity = SprintEntity::from_record("sprints", record.as_object().unwrap()).unwrap();
        let form = entity.to_form();
        assert!(!form.is_new());
        assert_eq!(form.original_status, Some(SprintStatus::Completed));
        assert_eq!(form.status, SprintStatus::Completed);
    }

    #[test]
    fn test_payload_excludes_bookkeeping() {
        let form = SprintForm::edit(9, SprintStatus::Planned)
            .with_name("  Sprint 9 ")
            .with_status(SprintStatus::Active)
            .with_dates(day(2026, 2, 1), day(2026, 2, 14))
            .with_project(4);
        let payload = form.to_payload();

        assert!(!payload.contains_key("id"));
        assert!(!payload.contains_key("original_status"));
        assert_eq!(payload["name"], json!("Sprint 9"));
        assert_eq!(payload["status"], json!("active"));
        assert_eq!(payload["start_date"], json!("2026-02-01"));
        assert_eq!(payload["project_id"], json!(4));
    }

    #[test]
    fn test_new_form_has_no_original_status() {
        let form = SprintForm::new("Kickoff");
        assert!(form.is_new());
        assert_eq!(form.original_status, None);
        assert_eq!(form.status, SprintStatus::Planned);
    }
}
