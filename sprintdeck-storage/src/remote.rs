//! The remote relational store seam.

use crate::builder::{RemoteQuery, RemoteWrite};
use ::async_trait::async_trait;
use sprintdeck_core::{Record, StoreError};

/// Opaque relational query/mutation API addressed by resource name.
///
/// Implementations own the wire format. Every method is a single
/// statement; nothing here is transactional across calls.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Run a read. A `single` query with no rows fails with
    /// [`StoreError::NoRows`], and with more than one row with
    /// [`StoreError::MultipleRows`].
    async fn select(&self, query: &RemoteQuery) -> Result<Vec<Record>, StoreError>;

    /// Run a write and return the affected rows.
    async fn execute(&self, write: &RemoteWrite) -> Result<Vec<Record>, StoreError>;
}
