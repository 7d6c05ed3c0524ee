//! Sprint form session
//!
//! One open create/edit dialog: validator and submission guard in front of
//! a mutation gateway on the sprint resource.

use crate::guard::{RejectReason, SubmissionGuard, SubmissionGuardState};
use crate::lifecycle::SprintLifecycle;
use sprintdeck_core::{
    Clock, DeckConfig, DeckError, FieldErrors, Notification, Notifier, NullNotifier, Record,
    SprintForm, StoreError,
};
use sprintdeck_storage::{MutationGateway, RemoteStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Result of one submit trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The write went through. The session is now closed.
    Committed(Record),
    /// Dropped by the guard. Nothing was sent.
    Rejected(RejectReason),
    /// Failed local validation. Nothing was sent.
    Invalid(FieldErrors),
    /// The store refused the write. The session stays open for a retry.
    Failed(StoreError),
}

impl SubmitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, SubmitOutcome::Committed(_))
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            SubmitOutcome::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

pub struct SprintFormSession {
    guard: SubmissionGuard,
    cancel: CancellationToken,
    gateway: MutationGateway,
    notifier: Arc<dyn Notifier>,
}

impl SprintFormSession {
    /// Open a session against the configured sprint resource.
    pub fn open(store: Arc<dyn RemoteStore>, clock: Arc<dyn Clock>, config: &DeckConfig) -> Self {
        let guard = SubmissionGuard::new(clock, &config.guard);
        guard.open();
        let cancel = CancellationToken::new();
        let gateway = MutationGateway::new(store, config.sprints.resource.as_str())
            .with_id_field(config.id_field.as_str())
            .with_cancellation(cancel.clone());
        Self {
            guard,
            cancel,
            gateway,
            notifier: Arc::new(NullNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.gateway = self.gateway.with_notifier(notifier.clone());
        self.notifier = notifier;
        self
    }

    /// Validate and persist `form`, at most once per session.
    pub async fn submit(&self, form: &SprintForm) -> SubmitOutcome {
        let permit = match self.guard.try_acquire() {
            Ok(permit) => permit,
            Err(reason) => return SubmitOutcome::Rejected(reason),
        };

        if let Err(err) = SprintLifecycle::validate(form) {
            self.guard.release(permit);
            let errors = err.into_field_errors();
            debug!(fields = errors.len(), "Sprint form failed validation");
            return SubmitOutcome::Invalid(errors);
        }

        let payload = form.to_payload();
        let result = match &form.id {
            None => self.gateway.try_create(payload).await,
            Some(id) => self.gateway.try_update(id, payload).await,
        };

        match result {
            Ok(row) => {
                self.guard.complete(permit);
                let verb = if form.is_new() { "created" } else { "updated" };
                info!(resource = self.gateway.resource(), verb, "Sprint saved");
                self.notifier
                    .notify(Notification::success(format!("Sprint {}", verb)));
                self.close();
                SubmitOutcome::Committed(row)
            }
            Err(err) => {
                self.guard.fail(permit);
                SubmitOutcome::Failed(into_store_error(err, self.gateway.resource()))
            }
        }
    }

    /// Close the dialog. An in-flight write is abandoned.
    pub fn close(&self) {
        self.cancel.cancel();
        self.guard.close();
    }

    pub fn is_open(&self) -> bool {
        self.guard.is_open()
    }

    pub fn guard_state(&self) -> SubmissionGuardState {
        self.guard.state()
    }

    pub fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }
}

fn into_store_error(err: DeckError, resource: &str) -> StoreError {
    match err {
        DeckError::Store(err) => err,
        other => StoreError::query(resource, other.to_string()),
    }
}

impl std::fmt::Debug for SprintFormSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SprintFormSession")
            .field("resource", &self.gateway.resource())
            .field("guard", &self.guard)
            .finish()
    }
}
