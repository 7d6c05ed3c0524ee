//! Sprintdeck Workflow - Guards in Front of the Gateways
//!
//! Sprint lifecycle validation, the per-form submission guard, the sprint
//! form session that combines both with a mutation gateway, the optimistic
//! kanban board coordinator, and sprint aggregate recompute.

pub mod aggregates;
pub mod board;
pub mod guard;
pub mod lifecycle;
pub mod session;

pub use aggregates::{recompute_sprint_aggregates, SprintAggregates, SPRINT_REF_FIELD};
pub use board::{
    BoardColumn, BoardColumns, BoardCoordinator, BoardMove, MoveOutcome, MovePlan, PendingMove,
};
pub use guard::{RejectReason, SubmissionGuard, SubmissionGuardState, SubmissionPermit};
pub use lifecycle::SprintLifecycle;
pub use session::{SprintFormSession, SubmitOutcome};
