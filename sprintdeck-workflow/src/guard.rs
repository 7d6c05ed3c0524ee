//! Submission idempotency guard
//!
//! Collapses rapid or duplicate submit triggers for one open form into at
//! most one committed write. Rejections are silent: callers drop the
//! submit without surfacing anything.

use parking_lot::Mutex;
use serde::Serialize;
use sprintdeck_core::{elapsed_ms, Clock, GuardConfig, Timestamp};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a submit trigger was dropped.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RejectReason {
    #[error("Form session is not open")]
    NotOpen,

    #[error("Submitted {elapsed_ms}ms after opening, inside the {window_ms}ms guard window")]
    WithinWindow { elapsed_ms: u64, window_ms: u64 },

    #[error("A submission is already in flight")]
    InFlight,

    #[error("This session has already submitted")]
    AlreadySubmitted,
}

/// Observable guard flags for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionGuardState {
    /// Submit triggers seen this session, accepted or not.
    pub attempt_count: u32,
    pub has_submitted: bool,
    pub is_submitting: bool,
    pub session_opened_at: Option<Timestamp>,
    pub submit_started_at: Option<Timestamp>,
}

/// Proof that a submission was admitted.
///
/// Outcomes reported with a permit from an earlier session, or from an
/// attempt superseded after the safety timeout, are ignored.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "report the outcome with complete, fail or release"]
pub struct SubmissionPermit {
    epoch: u64,
    ticket: u64,
}

#[derive(Debug, Default)]
struct GuardSession {
    flags: SubmissionGuardState,
    epoch: u64,
    ticket: u64,
}

impl GuardSession {
    fn owns(&self, permit: &SubmissionPermit) -> bool {
        permit.epoch == self.epoch && permit.ticket == self.ticket
    }
}

/// Per-form-session submission guard.
pub struct SubmissionGuard {
    clock: Arc<dyn Clock>,
    window_ms: u64,
    safety_timeout_ms: u64,
    session: Mutex<GuardSession>,
}

impl SubmissionGuard {
    pub fn new(clock: Arc<dyn Clock>, config: &GuardConfig) -> Self {
        Self {
            clock,
            window_ms: config.window_ms,
            safety_timeout_ms: config.safety_timeout_ms,
            session: Mutex::new(GuardSession::default()),
        }
    }

    /// Start a fresh session, discarding any previous flags.
    pub fn open(&self) {
        let mut session = self.session.lock();
        session.epoch += 1;
        session.flags = SubmissionGuardState {
            session_opened_at: Some(self.clock.now()),
            ..SubmissionGuardState::default()
        };
    }

    /// End the session. Outstanding permits become stale.
    pub fn close(&self) {
        let mut session = self.session.lock();
        session.epoch += 1;
        session.flags = SubmissionGuardState::default();
    }

    pub fn is_open(&self) -> bool {
        self.session.lock().flags.session_opened_at.is_some()
    }

    pub fn state(&self) -> SubmissionGuardState {
        self.session.lock().flags.clone()
    }

    /// Admit or drop one submit trigger.
    ///
    /// Rules in order: the guard window since opening, an in-flight
    /// submission, a completed submission.
    pub fn try_acquire(&self) -> Result<SubmissionPermit, RejectReason> {
        let now = self.clock.now();
        let mut session = self.session.lock();
        session.flags.attempt_count = session.flags.attempt_count.saturating_add(1);

        let Some(opened_at) = session.flags.session_opened_at else {
            debug!("Submit rejected: session not open");
            return Err(RejectReason::NotOpen);
        };

        if session.flags.is_submitting {
            let started = session.flags.submit_started_at.unwrap_or(opened_at);
            if elapsed_ms(started, now) >= self.safety_timeout_ms {
                warn!(
                    timeout_ms = self.safety_timeout_ms,
                    "Submission never settled, force-resetting in-flight flag"
                );
                session.flags.is_submitting = false;
                session.flags.submit_started_at = None;
            }
        }

        let elapsed = elapsed_ms(opened_at, now);
        let rejection = if elapsed < self.window_ms {
            Some(RejectReason::WithinWindow {
                elapsed_ms: elapsed,
                window_ms: self.window_ms,
            })
        } else if session.flags.is_submitting {
            Some(RejectReason::InFlight)
        } else if session.flags.has_submitted {
            Some(RejectReason::AlreadySubmitted)
        } else {
            None
        };
        if let Some(reason) = rejection {
            debug!(attempt = session.flags.attempt_count, %reason, "Submit rejected");
            return Err(reason);
        }

        session.ticket += 1;
        session.flags.is_submitting = true;
        session.flags.submit_started_at = Some(now);
        Ok(SubmissionPermit {
            epoch: session.epoch,
            ticket: session.ticket,
        })
    }

    /// The write committed. Later triggers this session are rejected.
    pub fn complete(&self, permit: SubmissionPermit) {
        let mut session = self.session.lock();
        if permit.epoch != session.epoch {
            debug!("Ignoring completion from a closed session");
            return;
        }
        // A write that outlived the safety timeout still committed.
        session.flags.has_submitted = true;
        if session.owns(&permit) {
            session.flags.is_submitting = false;
            session.flags.submit_started_at = None;
        }
    }

    /// The write failed. The session may submit again.
    pub fn fail(&self, permit: SubmissionPermit) {
        let mut session = self.session.lock();
        if !session.owns(&permit) {
            debug!("Ignoring failure from a stale permit");
            return;
        }
        session.flags.has_submitted = false;
        session.flags.is_submitting = false;
        session.flags.submit_started_at = None;
    }

    /// Give an admitted submission back without attempting the write.
    pub fn release(&self, permit: SubmissionPermit) {
        let mut session = self.session.lock();
        if session.owns(&permit) {
            session.flags.is_submitting = false;
            session.flags.submit_started_at = None;
        }
    }
}

impl std::fmt::Debug for SubmissionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionGuard")
            .field("window_ms", &self.window_ms)
            .field("safety_timeout_ms", &self.safety_timeout_ms)
            .field("state", &self.state())
            .finish()
    }
}


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
