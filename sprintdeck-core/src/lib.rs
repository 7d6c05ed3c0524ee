//! Sprintdeck Core - Data Types
//!
//! Identity, query descriptors, sprint records, errors, configuration,
//! time and notification types shared by every other sprintdeck crate.
//! Nothing in this crate talks to a store.

pub mod clock;
pub mod config;
pub mod enums;
pub mod error;
pub mod filter;
pub mod identity;
pub mod notifications;
pub mod query;
pub mod sprint;

pub use clock::{elapsed_ms, Clock, ManualClock, SystemClock};
pub use config::{BoardConfig, DeckConfig, GuardConfig, SprintConfig};
pub use enums::{SprintStatus, SprintStatusParseError};
pub use error::{
    BoardError, ConfigError, DeckError, DeckResult, FieldErrors, QueryError, StoreError,
    TransitionError, ValidationError,
};
pub use filter::{FilterClause, FilterOperator, FilterValue};
pub use identity::{Identifier, Record, Timestamp, DEFAULT_ID_FIELD};
pub use notifications::{
    Notification, NotificationAction, NotificationLevel, NotificationLog, Notifier, NullNotifier,
};
pub use query::{MutationKind, MutationRequest, OrderBy, QueryDescriptor};
pub use sprint::{SprintEntity, SprintField, SprintForm};
