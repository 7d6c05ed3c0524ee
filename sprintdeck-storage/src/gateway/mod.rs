//! Fetch and mutation gateways.
//!
//! Every operation comes in two forms. The `try_` form returns a typed
//! [`DeckResult`](sprintdeck_core::DeckResult). The plain form returns a
//! benign value (empty list, `None`, `false`) on failure. Either way a
//! store failure is recorded in [`GatewayState`] and surfaced through the
//! gateway's notifier.

/// Builder setters and accessors common to both gateway kinds.
macro_rules! gateway_common {
    ($gateway:ty) => {
        impl $gateway {
            /// Identify records by `id_field` instead of `id`.
            pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
                self.core.id_field = id_field.into();
                self
            }

            pub fn with_notifier(mut self, notifier: ::std::sync::Arc<dyn ::sprintdeck_core::Notifier>) -> Self {
                self.core.notifier = notifier;
                self
            }

            /// Check resource reachability through `cache` before each call.
            pub fn with_existence_cache(mut self, cache: ::std::sync::Arc<$crate::cache::TableExistenceCache>) -> Self {
                self.core.existence = Some(cache);
                self
            }

            /// Abandon calls once `token` is cancelled.
            pub fn with_cancellation(mut self, token: ::tokio_util::sync::CancellationToken) -> Self {
                self.core.cancel = token;
                self
            }

            pub fn resource(&self) -> &str {
                &self.core.resource
            }

            pub fn id_field(&self) -> &str {
                &self.core.id_field
            }

            pub fn state(&self) -> $crate::gateway::GatewayState {
                self.core.state.snapshot()
            }

            pub fn is_loading(&self) -> bool {
                self.core.state.snapshot().loading
            }

            pub fn error(&self) -> Option<::sprintdeck_core::StoreError> {
                self.core.state.snapshot().error
            }

            pub fn cancellation_token(&self) -> &::tokio_util::sync::CancellationToken {
                &self.core.cancel
            }

            /// Cancel every outstanding and future call on this gateway.
            pub fn cancel(&self) {
                self.core.cancel.cancel();
            }
        }
    };
}

pub(crate) use gateway_common;

pub mod fetch;
pub mod mutation;
pub mod state;

pub use fetch::FetchGateway;
pub use mutation::{MutationGateway, MutationOutcome};
pub use state::GatewayState;

use crate::cache::{ProbeOutcome, TableExistenceCache};
use crate::remote::RemoteStore;
use sprintdeck_core::{
    Notification, Notifier, NullNotifier, StoreError, DEFAULT_ID_FIELD,
};
use state::StateCell;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Collaborators and flags shared by both gateway kinds.
pub(crate) struct GatewayCore {
    store: Arc<dyn RemoteStore>,
    resource: String,
    id_field: String,
    notifier: Arc<dyn Notifier>,
    existence: Option<Arc<TableExistenceCache>>,
    cancel: CancellationToken,
    state: StateCell,
}

impl GatewayCore {
    pub(crate) fn new(store: Arc<dyn RemoteStore>, resource: String) -> Self {
        Self {
            store,
            resource,
            id_field: DEFAULT_ID_FIELD.to_string(),
            notifier: Arc::new(NullNotifier),
            existence: None,
            cancel: CancellationToken::new(),
            state: StateCell::default(),
        }
    }

    /// Run one store call with cancellation, existence checking and
    /// state/notification bookkeeping.
    ///
    /// A cancelled call returns [`StoreError::Cancelled`] and leaves the
    /// gateway state and notifier alone from that point on.
    pub(crate) async fn run<T, F>(
        &self,
        resource: &str,
        operation: &'static str,
        call: F,
    ) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if self.cancel.is_cancelled() {
            debug!(resource, operation, "Skipping call on cancelled gateway");
            return Err(StoreError::cancelled(resource));
        }

        let before = self.state.begin();
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StoreError::cancelled(resource)),
            result = self.checked(resource, call) => result,
        };

        if self.cancel.is_cancelled() {
            debug!(resource, operation, "Discarding result of cancelled call");
            self.state.restore(before);
            return Err(StoreError::cancelled(resource));
        }

        match &result {
            Ok(_) => self.state.succeed(),
            Err(err) => {
                error!(resource, operation, reason = %err, "Remote call failed");
                self.state.fail(err.clone());
                self.notifier.notify(Notification::failure(format!(
                    "Failed to {} {}",
                    operation, resource
                )));
            }
        }
        result
    }

    async fn checked<T, F>(&self, resource: &str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if let Some(cache) = &self.existence {
            match cache.probe(resource).await {
                ProbeOutcome::Present => {}
                ProbeOutcome::Absent => return Err(StoreError::unknown_resource(resource)),
                ProbeOutcome::Unavailable(err) => return Err(err),
            }
        }
        call.await
    }
}
