//! Write gateway.

use super::{gateway_common, GatewayCore};
use crate::builder::{QueryBuilder, RemoteWrite};
use crate::remote::RemoteStore;
use sprintdeck_core::{
    DeckResult, Identifier, MutationKind, MutationRequest, QueryError, Record, StoreError,
};
use std::sync::Arc;
use tracing::{error, warn};

/// What a resolved [`MutationRequest`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Created(Record),
    Updated(Record),
    Deleted,
}

impl MutationOutcome {
    /// The affected row, if the write returns one.
    pub fn record(&self) -> Option<&Record> {
        match self {
            MutationOutcome::Created(row) | MutationOutcome::Updated(row) => Some(row),
            MutationOutcome::Deleted => None,
        }
    }
}

/// Executes single-statement writes.
///
/// No retries and no transactions: a multi-step flow built from several
/// calls is not atomic.
pub struct MutationGateway {
    core: GatewayCore,
}

gateway_common!(MutationGateway);

impl MutationGateway {
    pub fn new(store: Arc<dyn RemoteStore>, resource: impl Into<String>) -> Self {
        Self {
            core: GatewayCore::new(store, resource.into()),
        }
    }

    /// Insert `payload` and return the stored row.
    ///
    /// A payload carrying its own identifier is passed through unchanged.
    pub async fn try_create(&self, payload: Record) -> DeckResult<Record> {
        let resource = self.core.resource.clone();
        self.create_in(&resource, payload).await
    }

    /// Apply `payload` to the row identified by `id` and return it.
    pub async fn try_update(&self, id: &Identifier, payload: Record) -> DeckResult<Record> {
        let resource = self.core.resource.clone();
        self.update_in(&resource, id, payload).await
    }

    /// Delete the row identified by `id`.
    pub async fn try_remove(&self, id: &Identifier) -> DeckResult<()> {
        let resource = self.core.resource.clone();
        self.remove_in(&resource, id).await
    }

    /// Perform the write a [`MutationRequest`] describes, against the
    /// request's own resource.
    pub async fn try_mutate(&self, request: &MutationRequest) -> DeckResult<MutationOutcome> {
        let kind = request.resolve_kind()?;
        let resource = request.resource.as_str();
        let outcome = match kind {
            MutationKind::Create => {
                let data = request.data.clone().ok_or(QueryError::MissingPayload {
                    operation: kind.as_str(),
                })?;
                MutationOutcome::Created(self.create_in(resource, data).await?)
            }
            MutationKind::Update => {
                let (id, data) = match (&request.id, &request.data) {
                    (Some(id), Some(data)) => (id, data.clone()),
                    (None, _) => {
                        return Err(QueryError::MissingIdentifier {
                            operation: kind.as_str(),
                        }
                        .into())
                    }
                    (_, None) => {
                        return Err(QueryError::MissingPayload {
                            operation: kind.as_str(),
                        }
                        .into())
                    }
                };
                MutationOutcome::Updated(self.update_in(resource, id, data).await?)
            }
            MutationKind::Delete => {
                let id = request.id.as_ref().ok_or(QueryError::MissingIdentifier {
                    operation: kind.as_str(),
                })?;
                self.remove_in(resource, id).await?;
                MutationOutcome::Deleted
            }
        };
        Ok(outcome)
    }

    pub async fn create(&self, payload: Record) -> Option<Record> {
        self.try_create(payload).await.ok()
    }

    pub async fn update(&self, id: &Identifier, payload: Record) -> Option<Record> {
        self.try_update(id, payload).await.ok()
    }

    /// `true` when the delete went through.
    pub async fn remove(&self, id: &Identifier) -> bool {
        self.try_remove(id).await.is_ok()
    }

    pub async fn mutate(&self, request: &MutationRequest) -> Option<MutationOutcome> {
        match self.try_mutate(request).await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                if err.as_store().is_none() {
                    error!(resource = %request.resource, reason = %err, "Rejected mutation request");
                }
                None
            }
        }
    }

    async fn create_in(&self, resource: &str, payload: Record) -> DeckResult<Record> {
        if let Some(id) = payload.get(&self.core.id_field) {
            warn!(
                resource,
                id = %id,
                "Create payload carries its own identifier; passing it through"
            );
        }
        let write = QueryBuilder::insert(resource, payload);
        self.first_row(&write, "create").await
    }

    async fn update_in(&self, resource: &str, id: &Identifier, payload: Record) -> DeckResult<Record> {
        let write = QueryBuilder::update(resource, &self.core.id_field, id, payload);
        self.first_row(&write, "update").await
    }

    async fn remove_in(&self, resource: &str, id: &Identifier) -> DeckResult<()> {
        let write = QueryBuilder::delete(resource, &self.core.id_field, id);
        self.core
            .run(resource, "delete", self.core.store.execute(&write))
            .await?;
        Ok(())
    }

    /// Run `write` and return the first affected row. No affected row is
    /// [`StoreError::NoRows`].
    async fn first_row(&self, write: &RemoteWrite, operation: &'static str) -> DeckResult<Record> {
        let call = async {
            let rows = self.core.store.execute(write).await?;
            rows.into_iter().next().ok_or_else(|| StoreError::NoRows {
                resource: write.resource.clone(),
            })
        };
        let row = self.core.run(&write.resource, operation, call).await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{CallKind, MemoryStore};
    use serde_json::json;
    use sprintdeck_core::{DeckError, NotificationLevel, NotificationLog};

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    fn setup() -> (Arc<MemoryStore>, Arc<NotificationLog>, MutationGateway) {
        let store = Arc::new(MemoryStore::new().with_table("sprints", ["name", "status"]));
        store
            .seed("sprints", [record(json!({"name": "Sprint 1", "status": "planned"}))])
            .unwrap();
        let log = Arc::new(NotificationLog::new());
        let gateway = MutationGateway::new(store.clone(), "sprints").with_notifier(log.clone());
        (store, log, gateway)
    }

    #[tokio::test]
    async fn test_create_returns_stored_row() {
        let (store, _, gateway) = setup();
        let row = gateway
            .try_create(record(json!({"name": "Sprint 2"})))
            .await
            .unwrap();
        assert_eq!(row["id"], json!(2));
        assert_eq!(store.call_count(CallKind::Insert), 1);
    }

    #[tokio::test]
    async fn test_create_with_own_identifier_passes_through() {
        let (store, _, gateway) = setup();
        let row = gateway
            .try_create(record(json!({"id": 10, "name": "Imported"})))
            .await
            .unwrap();
        assert_eq!(row["id"], json!(10));
        let call = &store.calls_to(CallKind::Insert, "sprints")[0];
        assert_eq!(call.payload.as_ref().map(|p| p["id"].clone()), Some(json!(10)));
    }

    #[tokio::test]
    async fn test_update_returns_first_affected_row() {
        let (_, _, gateway) = setup();
        let row = gateway
            .update(&Identifier::Int(1), record(json!({"status": "active"})))
            .await
            .unwrap();
        assert_eq!(row["status"], json!("active"));
        assert!(gateway.error().is_none());
    }

    #[tokio::test]
    async fn test_update_of_missing_row_fails() {
        let (_, log, gateway) = setup();
        let row = gateway
            .update(&Identifier::Int(99), record(json!({"status": "active"})))
            .await;
        assert!(row.is_none());
        assert!(matches!(gateway.error(), Some(StoreError::NoRows { .. })));
        assert_eq!(log.count(NotificationLevel::Error), 1);
    }

    #[tokio::test]
    async fn test_remove_reports_success_as_bool() {
        let (store, _, gateway) = setup();
        assert!(gateway.remove(&Identifier::Int(1)).await);
        assert!(store.rows("sprints").is_empty());

        store.fail_next("sprints", StoreError::transport("sprints", "reset"));
        assert!(!gateway.remove(&Identifier::Int(1)).await);
    }

    #[tokio::test]
    async fn test_failure_returns_none_and_notifies_with_retry() {
        let (store, log, gateway) = setup();
        store.fail_next("sprints", StoreError::transport("sprints", "reset"));

        assert!(gateway.create(record(json!({"name": "X"}))).await.is_none());
        let notification = log.last().unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert!(notification.message.contains("sprints"));
        assert!(notification.action.is_some());
    }

    #[tokio::test]
    async fn test_mutate_infers_kind() {
        let (store, _, gateway) = setup();

        let created = gateway
            .try_mutate(&MutationRequest::new("sprints").with_data(record(json!({"name": "S2"}))))
            .await
            .unwrap();
        assert!(matches!(created, MutationOutcome::Created(_)));

        let updated = gateway
            .try_mutate(
                &MutationRequest::new("sprints")
                    .with_id(2)
                    .with_data(record(json!({"status": "active"}))),
            )
            .await
            .unwrap();
        assert_eq!(updated.record().map(|r| r["status"].clone()), Some(json!("active")));

        let deleted = gateway
            .try_mutate(&MutationRequest::new("sprints").with_id(2))
            .await
            .unwrap();
        assert_eq!(deleted, MutationOutcome::Deleted);
        assert_eq!(store.rows("sprints").len(), 1);
    }

    #[tokio::test]
    async fn test_mutate_targets_request_resource() {
        let (store, _, gateway) = setup();
        store.create_table("tasks", ["title"]);

        gateway
            .try_mutate(&MutationRequest::new("tasks").with_data(record(json!({"title": "T"}))))
            .await
            .unwrap();
        assert_eq!(store.rows("tasks").len(), 1);
        assert_eq!(store.rows("sprints").len(), 1);
    }

    #[tokio::test]
    async fn test_mutate_rejects_bad_request_without_calling_store() {
        let (store, log, gateway) = setup();
        let request = MutationRequest::new("sprints").with_kind(MutationKind::Update);

        let err = gateway.try_mutate(&request).await.unwrap_err();
        assert!(matches!(err, DeckError::Query(QueryError::MissingIdentifier { .. })));
        assert!(gateway.mutate(&request).await.is_none());
        assert!(store.calls().is_empty());
        assert!(log.is_empty());
    }
}
