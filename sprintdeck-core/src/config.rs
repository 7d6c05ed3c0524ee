//! Configuration for the data-access and workflow layers.
//!
//! Every field has a default, so an empty TOML document is a valid config.
//! Unknown keys are rejected.

use crate::error::ConfigError;
use crate::identity::DEFAULT_ID_FIELD;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DeckConfig {
    /// Column that identifies records in every resource.
    pub id_field: String,
    pub guard: GuardConfig,
    pub board: BoardConfig,
    pub sprints: SprintConfig,
}

/// Submission guard timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GuardConfig {
    /// Submits earlier than this after the form opened are dropped.
    pub window_ms: u64,
    /// In-flight flags are force-cleared after this long.
    pub safety_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BoardConfig {
    pub resource: String,
    pub status_field: String,
    /// Column order, left to right.
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SprintConfig {
    pub resource: String,
    pub task_resource: String,
    /// Task status counted as completed by aggregate recompute.
    pub done_status: String,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            guard: GuardConfig::default(),
            board: BoardConfig::default(),
            sprints: SprintConfig::default(),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            window_ms: 500,
            safety_timeout_ms: 10_000,
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            resource: "tasks".to_string(),
            status_field: "status".to_string(),
            columns: ["todo", "in_progress", "review", "done"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            resource: "sprints".to_string(),
            task_resource: "tasks".to_string(),
            done_status: "done".to_string(),
        }
    }
}

impl DeckConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: DeckConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn with_guard_window_ms(mut self, window_ms: u64) -> Self {
        self.guard.window_ms = window_ms;
        self
    }

    pub fn with_safety_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.guard.safety_timeout_ms = timeout_ms;
        self
    }

    pub fn with_board_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.board.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id_field.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "id_field",
                reason: "must not be empty".to_string(),
            });
        }
        if self.guard.window_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "guard.window_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.guard.safety_timeout_ms <= self.guard.window_ms {
            return Err(ConfigError::InvalidValue {
                field: "guard.safety_timeout_ms",
                reason: "must be > window_ms".to_string(),
            });
        }
        if self.board.resource.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "board.resource",
                reason: "must not be empty".to_string(),
            });
        }
        if self.board.status_field.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "board.status_field",
                reason: "must not be empty".to_string(),
            });
        }
        if self.board.columns.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "board.columns",
                reason: "must list at least one column".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for column in &self.board.columns {
            if column.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "board.columns",
                    reason: "column names must not be empty".to_string(),
                });
            }
            if !seen.insert(column.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "board.columns",
                    reason: format!("duplicate column '{}'", column),
                });
            }
        }
        if self.sprints.resource.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "sprints.resource",
                reason: "must not be empty".to_string(),
            });
        }
        if self.sprints.task_resource.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "sprints.task_resource",
                reason: "must not be empty".to_string(),
            });
        }
        if self.sprints.done_status.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "sprints.done_status",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn invalid_field(err: ConfigError) -> &'static str {
        match err {
            ConfigError::InvalidValue { field, .. } => field,
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = DeckConfig::from_toml_str("").unwrap();
        assert_eq!(config, DeckConfig::default());
        assert_eq!(config.id_field, "id");
        assert_eq!(config.guard.window_ms, 500);
        assert_eq!(config.board.columns.len(), 4);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = DeckConfig::from_toml_str(
            r#"
            id_field = "uuid"

            [guard]
            window_ms = 250

            [board]
            columns = ["backlog", "doing", "done"]
            "#,
        )
        .unwrap();
        assert_eq!(config.id_field, "uuid");
        assert_eq!(config.guard.window_ms, 250);
        assert_eq!(config.guard.safety_timeout_ms, 10_000);
        assert_eq!(config.board.status_field, "status");
        assert_eq!(config.board.columns, vec!["backlog", "doing", "done"]);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = DeckConfig::from_toml_str("[guard]\nwindow = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_safety_timeout_must_exceed_window() {
        let config = DeckConfig::new()
            .with_guard_window_ms(500)
            .with_safety_timeout_ms(500);
        assert_eq!(
            invalid_field(config.validate().unwrap_err()),
            "guard.safety_timeout_ms"
        );
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let config = DeckConfig::new().with_board_columns(["todo", "done", "todo"]);
        assert_eq!(invalid_field(config.validate().unwrap_err()), "board.columns");

        let config = DeckConfig::new().with_board_columns(Vec::<String>::new());
        assert_eq!(invalid_field(config.validate().unwrap_err()), "board.columns");
    }

    #[test]
    fn test_from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sprints]\ndone_status = \"closed\"").unwrap();

        let config = DeckConfig::from_path(file.path()).unwrap();
        assert_eq!(config.sprints.done_status, "closed");
        assert_eq!(config.sprints.resource, "sprints");
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeckConfig::from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
