//! Read gateway.

use super::{gateway_common, GatewayCore};
use crate::builder::QueryBuilder;
use crate::remote::RemoteStore;
use sprintdeck_core::{DeckResult, Identifier, QueryDescriptor, Record, StoreError};
use std::sync::Arc;

/// Executes reads and normalizes "no rows" into success.
pub struct FetchGateway {
    core: GatewayCore,
}

gateway_common!(FetchGateway);

impl FetchGateway {
    pub fn new(store: Arc<dyn RemoteStore>, resource: impl Into<String>) -> Self {
        Self {
            core: GatewayCore::new(store, resource.into()),
        }
    }

    /// Descriptor selecting every column of this gateway's resource.
    pub fn query(&self) -> QueryDescriptor {
        QueryDescriptor::table(self.core.resource.as_str())
    }

    /// Rows matching `descriptor`. Zero matching rows is an empty vector.
    pub async fn try_fetch_all(&self, descriptor: &QueryDescriptor) -> DeckResult<Vec<Record>> {
        let query = QueryBuilder::build(descriptor);
        let rows = self
            .core
            .run(&query.resource, "fetch", self.core.store.select(&query))
            .await?;
        Ok(rows)
    }

    /// The row of `descriptor`'s resource whose identifier is `id`.
    ///
    /// A missing row is `Ok(None)` and leaves the error flag clear.
    pub async fn try_fetch_by_id(
        &self,
        id: &Identifier,
        descriptor: &QueryDescriptor,
    ) -> DeckResult<Option<Record>> {
        let query = QueryBuilder::build(descriptor).single_by_id(&self.core.id_field, id);
        let call = async {
            match self.core.store.select(&query).await {
                Ok(rows) => Ok(rows.into_iter().next()),
                Err(StoreError::NoRows { .. }) => Ok(None),
                Err(err) => Err(err),
            }
        };
        let row = self.core.run(&query.resource, "fetch", call).await?;
        Ok(row)
    }

    /// Like [`try_fetch_all`](Self::try_fetch_all), returning an empty
    /// vector on failure.
    pub async fn fetch_all(&self, descriptor: &QueryDescriptor) -> Vec<Record> {
        self.try_fetch_all(descriptor).await.unwrap_or_default()
    }

    /// Like [`try_fetch_by_id`](Self::try_fetch_by_id), returning `None` on failure.
    pub async fn fetch_by_id(&self, id: &Identifier, descriptor: &QueryDescriptor) -> Option<Record> {
        self.try_fetch_by_id(id, descriptor).await.ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TableExistenceCache;
    use crate::gateway::GatewayState;
    use crate::memory::{CallKind, MemoryStore};
    use serde_json::json;
    use sprintdeck_core::{
        DeckError, FilterClause, NotificationLevel, NotificationLog, SystemClock,
    };
    use std::time::Duration;

    fn store() -> Arc<MemoryStore> {
        let store = MemoryStore::new().with_table("tasks", ["title", "status"]);
        store
            .seed(
                "tasks",
                [
                    json!({"title": "A", "status": "todo"}),
                    json!({"title": "B", "status": "done"}),
                ]
                .into_iter()
                .filter_map(|v| v.as_object().cloned()),
            )
            .unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_empty_result_is_empty_vec_without_error() {
        let gateway = FetchGateway::new(store(), "tasks");
        let descriptor = gateway.query().filter(FilterClause::eq("status", "review"));
        let rows = gateway.fetch_all(&descriptor).await;
        assert!(rows.is_empty());
        assert!(gateway.error().is_none());
        assert!(!gateway.is_loading());
    }

    #[tokio::test]
    async fn test_fetch_all_returns_rows() {
        let gateway = FetchGateway::new(store(), "tasks");
        let rows = gateway.try_fetch_all(&gateway.query()).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_sets_error_and_notifies() {
        let store = store();
        let log = Arc::new(NotificationLog::new());
        let gateway = FetchGateway::new(store.clone(), "tasks").with_notifier(log.clone());
        store.fail_next("tasks", StoreError::transport("tasks", "reset"));

        let rows = gateway.fetch_all(&gateway.query()).await;
        assert!(rows.is_empty());
        assert!(matches!(gateway.error(), Some(StoreError::Transport { .. })));
        assert!(!gateway.is_loading());
        assert_eq!(log.count(NotificationLevel::Error), 1);

        // The next call clears the flag.
        assert_eq!(gateway.fetch_all(&gateway.query()).await.len(), 2);
        assert!(gateway.error().is_none());
    }

    #[tokio::test]
    async fn test_fetch_by_id_missing_row_is_none() {
        let log = Arc::new(NotificationLog::new());
        let gateway = FetchGateway::new(store(), "tasks").with_notifier(log.clone());

        let found = gateway
            .try_fetch_by_id(&Identifier::Int(2), &gateway.query())
            .await
            .unwrap();
        assert_eq!(found.map(|r| r["title"].clone()), Some(json!("B")));

        let missing = gateway
            .try_fetch_by_id(&Identifier::Int(42), &gateway.query())
            .await
            .unwrap();
        assert!(missing.is_none());
        assert!(gateway.error().is_none());
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_column_surfaces_at_execution() {
        let gateway = FetchGateway::new(store(), "tasks");
        let descriptor = gateway.query().filter(FilterClause::eq("owner", "kim"));
        let err = gateway.try_fetch_all(&descriptor).await.unwrap_err();
        assert!(matches!(err, DeckError::Store(StoreError::Query { .. })));
    }

    #[tokio::test]
    async fn test_existence_cache_blocks_absent_resource() {
        let store = store();
        let cache = Arc::new(TableExistenceCache::new(store.clone(), Arc::new(SystemClock)));
        let gateway = FetchGateway::new(store.clone(), "epics").with_existence_cache(cache.clone());

        let err = gateway.try_fetch_all(&gateway.query()).await.unwrap_err();
        assert!(matches!(err, DeckError::Store(StoreError::UnknownResource { .. })));
        let err = gateway.try_fetch_all(&gateway.query()).await.unwrap_err();
        assert!(matches!(err, DeckError::Store(StoreError::UnknownResource { .. })));

        // One probe, and the statement itself never ran.
        assert_eq!(store.call_count(CallKind::Select), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_call_issues_nothing() {
        let store = store();
        let log = Arc::new(NotificationLog::new());
        let gateway = FetchGateway::new(store.clone(), "tasks").with_notifier(log.clone());
        gateway.cancel();

        let err = gateway.try_fetch_all(&gateway.query()).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(store.calls().is_empty());
        assert_eq!(gateway.state(), GatewayState::default());
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_call_discards_result() {
        let store = store();
        let log = Arc::new(NotificationLog::new());
        let gateway = Arc::new(FetchGateway::new(store.clone(), "tasks").with_notifier(log.clone()));
        store.pause();

        let task = {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.try_fetch_all(&gateway.query()).await })
        };
        while store.calls().is_empty() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        gateway.cancel();
        store.resume();

        let result = task.await.unwrap();
        assert!(result.unwrap_err().is_cancelled());
        assert!(gateway.error().is_none());
        assert!(log.is_empty());
    }
}
