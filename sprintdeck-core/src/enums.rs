//! Enum types for sprintdeck entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SPRINT STATUS
// ============================================================================

/// Lifecycle status of a sprint.
///
/// # Transition Table
///
/// ```text
/// planned ──┬── active ──┬── completed (terminal)
///           │            └── cancelled
///           └── cancelled ── planned
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum SprintStatus {
    #[default]
    Planned,
    Active,
    Completed,
    Cancelled,
}

impl SprintStatus {
    pub const ALL: [SprintStatus; 4] = [
        SprintStatus::Planned,
        SprintStatus::Active,
        SprintStatus::Completed,
        SprintStatus::Cancelled,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SprintStatus::Planned => "planned",
            SprintStatus::Active => "active",
            SprintStatus::Completed => "completed",
            SprintStatus::Cancelled => "cancelled",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, SprintStatusParseError> {
        match s.to_lowercase().as_str() {
            "planned" => Ok(SprintStatus::Planned),
            "active" => Ok(SprintStatus::Active),
            "completed" => Ok(SprintStatus::Completed),
            "cancelled" | "canceled" => Ok(SprintStatus::Cancelled),
            _ => Err(SprintStatusParseError(s.to_string())),
        }
    }

    /// Statuses reachable from this one in a single edit.
    pub fn allowed_transitions(&self) -> &'static [SprintStatus] {
        match self {
            SprintStatus::Planned => &[SprintStatus::Active, SprintStatus::Cancelled],
            SprintStatus::Active => &[SprintStatus::Completed, SprintStatus::Cancelled],
            // No reopen path exists.
            SprintStatus::Completed => &[],
            SprintStatus::Cancelled => &[SprintStatus::Planned],
        }
    }

    /// Check whether `next` is an edge in the transition table.
    ///
    /// Staying in the same status is not an edge.
    pub fn can_transition_to(&self, next: SprintStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Check if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for SprintStatus {
    type Err = SprintStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid sprint status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintStatusParseError(pub String);

impl fmt::Display for SprintStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid sprint status: {}", self.0)
    }
}

impl std::error::Error for SprintStatusParseError {}
