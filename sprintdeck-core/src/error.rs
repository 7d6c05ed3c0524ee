//! Error types for sprintdeck operations

use crate::enums::SprintStatus;
use crate::identity::Identifier;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Remote store errors.
///
/// "No rows" is represented here so the store can report it, but the
/// fetch gateway treats it as success.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Transport failure on {resource}: {reason}")]
    Transport { resource: String, reason: String },

    #[error("Query rejected on {resource}: {reason}")]
    Query { resource: String, reason: String },

    #[error("Unknown resource: {resource}")]
    UnknownResource { resource: String },

    #[error("No rows returned from {resource}")]
    NoRows { resource: String },

    #[error("Expected a single row from {resource}, got {count}")]
    MultipleRows { resource: String, count: usize },

    #[error("Failed to decode row from {resource}: {reason}")]
    Decode { resource: String, reason: String },

    #[error("Operation on {resource} was cancelled")]
    Cancelled { resource: String },
}

impl StoreError {
    pub fn transport(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Transport {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    pub fn query(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Query {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_resource(resource: impl Into<String>) -> Self {
        StoreError::UnknownResource {
            resource: resource.into(),
        }
    }

    pub fn cancelled(resource: impl Into<String>) -> Self {
        StoreError::Cancelled {
            resource: resource.into(),
        }
    }

    /// Resource the failing statement targeted.
    pub fn resource(&self) -> &str {
        match self {
            StoreError::Transport { resource, .. }
            | StoreError::Query { resource, .. }
            | StoreError::UnknownResource { resource }
            | StoreError::NoRows { resource }
            | StoreError::MultipleRows { resource, .. }
            | StoreError::Decode { resource, .. }
            | StoreError::Cancelled { resource } => resource,
        }
    }

    /// The store confirmed the resource does not exist.
    pub fn is_structural_absence(&self) -> bool {
        matches!(self, StoreError::UnknownResource { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StoreError::Cancelled { .. })
    }
}

/// Query construction errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Unknown filter operator: {operator}")]
    UnknownOperator { operator: String },

    #[error("Filter on {column} uses 'in' and requires a list value")]
    ListRequired { column: String },

    #[error("An identifier is required for {operation}")]
    MissingIdentifier { operation: &'static str },

    #[error("A payload is required for {operation}")]
    MissingPayload { operation: &'static str },

    #[error("Mutation on {resource} carries neither an identifier nor a payload")]
    EmptyMutation { resource: String },
}

/// Illegal sprint status change.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Cannot move sprint from {from} to {to}")]
pub struct TransitionError {
    pub from: SprintStatus,
    pub to: SprintStatus,
}

/// Field-level validation failures, keyed by field name.
///
/// A failed transition check is carried alongside the field messages and
/// also reported under the `status` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    messages: BTreeMap<String, String>,
    transition: Option<TransitionError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field. The first message for a field wins.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.messages
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    pub fn set_transition(&mut self, error: TransitionError) {
        self.insert("status", error.to_string());
        self.transition = Some(error);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.messages.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.messages.contains_key(field)
    }

    pub fn transition(&self) -> Option<&TransitionError> {
        self.transition.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.messages
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Fields(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Validation errors raised before any remote call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid fields: {0}")]
    Fields(FieldErrors),

    #[error("Invalid transition: {0}")]
    Transition(#[from] TransitionError),
}

impl ValidationError {
    /// Field messages, with a bare transition failure reported under `status`.
    pub fn into_field_errors(self) -> FieldErrors {
        match self {
            ValidationError::Fields(fields) => fields,
            ValidationError::Transition(error) => {
                let mut fields = FieldErrors::new();
                fields.set_transition(error);
                fields
            }
        }
    }

    pub fn is_transition(&self) -> bool {
        match self {
            ValidationError::Fields(fields) => fields.transition().is_some(),
            ValidationError::Transition(_) => true,
        }
    }
}

/// Board partition errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("Unknown board column: {column}")]
    UnknownColumn { column: String },

    #[error("Index {index} out of range for column {column} of length {len}")]
    IndexOutOfRange {
        column: String,
        index: usize,
        len: usize,
    },

    #[error("Column {column} holds {found} at index {index}, not {expected}")]
    ItemMismatch {
        column: String,
        index: usize,
        expected: Identifier,
        found: Identifier,
    },

    #[error("Item {id} is not on the board")]
    UnknownItem { id: Identifier },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Master error type for all sprintdeck errors.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Board error: {0}")]
    Board(#[from] BoardError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl DeckError {
    /// The underlying store error, if this came from the remote side.
    pub fn as_store(&self) -> Option<&StoreError> {
        match self {
            DeckError::Store(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.as_store().is_some_and(StoreError::is_cancelled)
    }
}

impl From<TransitionError> for DeckError {
    fn from(err: TransitionError) -> Self {
        DeckError::Validation(ValidationError::Transition(err))
    }
}

/// Result type alias for sprintdeck operations.
pub type DeckResult<T> = Result<T, DeckError>;

// =============================================================================
// TESTS
// =============================================================================
