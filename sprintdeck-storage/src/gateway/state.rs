//! Loading and error flags exposed by a gateway.

use parking_lot::Mutex;
use sprintdeck_core::StoreError;

/// Snapshot of a gateway's flags.
///
/// `loading` is set when a call starts and cleared when it finishes.
/// Overlapping calls on one gateway each toggle it, so it is not a count
/// of outstanding calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayState {
    pub loading: bool,
    /// Failure of the most recent call, cleared when the next call starts.
    pub error: Option<StoreError>,
}

#[derive(Debug, Default)]
pub(crate) struct StateCell {
    inner: Mutex<GatewayState>,
}

impl StateCell {
    /// Mark a call as started. Returns the flags it replaced.
    pub(crate) fn begin(&self) -> GatewayState {
        let mut state = self.inner.lock();
        let before = state.clone();
        state.loading = true;
        state.error = None;
        before
    }

    /// Put back flags saved by [`begin`](Self::begin) for a call whose
    /// result was discarded.
    pub(crate) fn restore(&self, before: GatewayState) {
        *self.inner.lock() = before;
    }

    pub(crate) fn succeed(&self) {
        self.inner.lock().loading = false;
    }

    pub(crate) fn fail(&self, error: StoreError) {
        let mut state = self.inner.lock();
        state.loading = false;
        state.error = Some(error);
    }

    pub(crate) fn snapshot(&self) -> GatewayState {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_clears_previous_error() {
        let cell = StateCell::default();
        let _ = cell.begin();
        cell.fail(StoreError::transport("tasks", "reset"));
        assert!(cell.snapshot().error.is_some());
        assert!(!cell.snapshot().loading);

        let before = cell.begin();
        assert!(before.error.is_some());
        assert_eq!(
            cell.snapshot(),
            GatewayState {
                loading: true,
                error: None
            }
        );
        cell.succeed();
        assert_eq!(cell.snapshot(), GatewayState::default());
    }

    #[test]
    fn test_restore_undoes_begin() {
        let cell = StateCell::default();
        let _ = cell.begin();
        cell.fail(StoreError::transport("tasks", "reset"));

        let before = cell.begin();
        cell.restore(before.clone());
        assert_eq!(cell.snapshot(), before);
        assert!(!cell.snapshot().loading);
    }
}
