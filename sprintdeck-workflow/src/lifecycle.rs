//! Sprint lifecycle validation
//!
//! Runs entirely locally. A form that fails here never reaches a gateway.

use sprintdeck_core::{
    FieldErrors, SprintField, SprintForm, SprintStatus, TransitionError, ValidationError,
};

/// Validator for sprint forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct SprintLifecycle;

impl SprintLifecycle {
    /// Check a status change against the transition table.
    ///
    /// A new sprint (no original status) may start in any status. An edit
    /// must follow an edge of the table; there are no self-edges.
    pub fn check_transition(
        original: Option<SprintStatus>,
        next: SprintStatus,
    ) -> Result<(), TransitionError> {
        let Some(from) = original else {
            return Ok(());
        };
        if from.can_transition_to(next) {
            Ok(())
        } else {
            Err(TransitionError { from, to: next })
        }
    }

    /// Validate every field and the status transition, collecting all
    /// failures rather than stopping at the first.
    pub fn validate(form: &SprintForm) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();

        if form.name.trim().is_empty() {
            errors.insert(SprintField::Name.as_str(), "Name is required");
        }
        if form.start_date.is_none() {
            errors.insert(SprintField::StartDate.as_str(), "Start date is required");
        }
        match (form.start_date, form.end_date) {
            (_, None) => errors.insert(SprintField::EndDate.as_str(), "End date is required"),
            (Some(start), Some(end)) if end < start => errors.insert(
                SprintField::EndDate.as_str(),
                "End date must be on or after the start date",
            ),
            _ => {}
        }
        if form.project_id.is_none() {
            errors.insert(SprintField::ProjectId.as_str(), "Project is required");
        }
        if let Err(transition) = Self::check_transition(form.original_status, form.status) {
            errors.set_transition(transition);
        }

        errors.into_result()
    }
}


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
