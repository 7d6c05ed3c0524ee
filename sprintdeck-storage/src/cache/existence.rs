//! Table-existence cache.

use crate::builder::RemoteQuery;
use crate::remote::RemoteStore;
use parking_lot::Mutex;
use sprintdeck_core::{Clock, StoreError, Timestamp, DEFAULT_ID_FIELD};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of looking a resource up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The probe succeeded.
    Present,
    /// The store reported the resource does not exist.
    Absent,
    /// The probe failed for another reason. Not remembered.
    Unavailable(StoreError),
}

impl ProbeOutcome {
    pub fn exists(&self) -> bool {
        matches!(self, ProbeOutcome::Present)
    }
}

/// A remembered probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistenceEntry {
    pub exists: bool,
    pub probed_at: Timestamp,
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExistenceStats {
    /// Lookups answered from memory.
    pub hits: u64,
    /// Probe statements issued.
    pub probes: u64,
    /// Probes that failed without a structural answer.
    pub transient_failures: u64,
    /// Number of remembered resources.
    pub entry_count: u64,
}

impl ExistenceStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.probes;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Lazily populated map from resource name to reachability.
///
/// Entries never expire. They are removed only by [`clear`](Self::clear);
/// a successful create against a resource remembered as absent does not
/// invalidate it.
pub struct TableExistenceCache {
    store: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    probe_column: String,
    entries: Mutex<HashMap<String, ExistenceEntry>>,
    stats: Mutex<ExistenceStats>,
}

impl TableExistenceCache {
    pub fn new(store: Arc<dyn RemoteStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            probe_column: DEFAULT_ID_FIELD.to_string(),
            entries: Mutex::new(HashMap::new()),
            stats: Mutex::new(ExistenceStats::default()),
        }
    }

    /// Column selected by probe statements.
    pub fn with_probe_column(mut self, column: impl Into<String>) -> Self {
        self.probe_column = column.into();
        self
    }

    /// Whether `resource` is reachable. Transient failures read as `false`.
    pub async fn exists(&self, resource: &str) -> bool {
        self.probe(resource).await.exists()
    }

    /// Look `resource` up, probing the store on a miss.
    pub async fn probe(&self, resource: &str) -> ProbeOutcome {
        if let Some(entry) = self.entry(resource) {
            self.stats.lock().hits += 1;
            return if entry.exists {
                ProbeOutcome::Present
            } else {
                ProbeOutcome::Absent
            };
        }

        self.stats.lock().probes += 1;
        let query = RemoteQuery::probe(resource, self.probe_column.as_str());
        let outcome = match self.store.select(&query).await {
            Ok(_) => ProbeOutcome::Present,
            Err(err) if err.is_structural_absence() => ProbeOutcome::Absent,
            Err(err) => ProbeOutcome::Unavailable(err),
        };

        match &outcome {
            ProbeOutcome::Present | ProbeOutcome::Absent => {
                let exists = outcome.exists();
                debug!(resource, exists, "Existence probe resolved");
                self.remember(resource, exists);
            }
            ProbeOutcome::Unavailable(err) => {
                warn!(resource, reason = %err, "Existence probe failed, not caching");
                self.stats.lock().transient_failures += 1;
            }
        }
        outcome
    }

    pub fn entry(&self, resource: &str) -> Option<ExistenceEntry> {
        self.entries.lock().get(resource).copied()
    }

    /// Forget one resource, or everything when `resource` is `None`.
    pub fn clear(&self, resource: Option<&str>) {
        let mut entries = self.entries.lock();
        match resource {
            Some(name) => {
                entries.remove(name);
            }
            None => entries.clear(),
        }
        self.stats.lock().entry_count = entries.len() as u64;
    }

    pub fn stats(&self) -> ExistenceStats {
        *self.stats.lock()
    }

    fn remember(&self, resource: &str, exists: bool) {
        let mut entries = self.entries.lock();
        entries.insert(
            resource.to_string(),
            ExistenceEntry {
                exists,
                probed_at: self.clock.now(),
            },
        );
        self.stats.lock().entry_count = entries.len() as u64;
    }
}

impl std::fmt::Debug for TableExistenceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableExistenceCache")
            .field("probe_column", &self.probe_column)
            .field("entries", &*self.entries.lock())
            .field("stats", &*self.stats.lock())
            .finish_non_exhaustive()
    }
}
