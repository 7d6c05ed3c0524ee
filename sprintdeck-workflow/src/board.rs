//! Kanban board state and optimistic reorder
//!
//! [`BoardColumns`] partitions item identifiers by status. A drag is
//! applied to the local partition first; a cross-column drag then writes
//! the new status, and the partition is restored if the write fails.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sprintdeck_core::{
    BoardError, DeckConfig, DeckError, Identifier, Notification, Notifier, NullNotifier, Record,
    StoreError,
};
use sprintdeck_storage::{MutationGateway, RemoteStore};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

// ============================================================================
// COLUMNS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub status: String,
    pub items: Vec<Identifier>,
}

impl BoardColumn {
    fn empty(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            items: Vec::new(),
        }
    }
}

/// Ordered partition of board items into status columns.
///
/// Every item appears in exactly one column, once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumns {
    columns: Vec<BoardColumn>,
}

impl BoardColumns {
    /// Partition `items` by `status_field`.
    ///
    /// Columns follow `column_order`; statuses not listed there get
    /// columns appended in first-seen order. Items without an identifier
    /// or a string status, and repeated identifiers, are skipped.
    pub fn from_items<S: AsRef<str>>(
        items: &[Record],
        column_order: &[S],
        status_field: &str,
        id_field: &str,
    ) -> Self {
        let mut columns: Vec<BoardColumn> = column_order
            .iter()
            .map(|status| BoardColumn::empty(status.as_ref()))
            .collect();
        let mut seen = HashSet::new();

        for item in items {
            let Some(id) = Identifier::of(item, id_field) else {
                warn!(id_field, "Skipping board item without identifier");
                continue;
            };
            let Some(status) = item.get(status_field).and_then(Value::as_str) else {
                warn!(id = %id, status_field, "Skipping board item without status");
                continue;
            };
            if !seen.insert(id.clone()) {
                warn!(id = %id, "Skipping duplicate board item");
                continue;
            }
            match columns.iter_mut().find(|c| c.status == status) {
                Some(column) => column.items.push(id),
                None => columns.push(BoardColumn {
                    status: status.to_string(),
                    items: vec![id],
                }),
            }
        }

        Self { columns }
    }

    pub fn columns(&self) -> &[BoardColumn] {
        &self.columns
    }

    pub fn column(&self, status: &str) -> Option<&BoardColumn> {
        self.columns.iter().find(|c| c.status == status)
    }

    /// Column status and index currently holding `id`.
    pub fn locate(&self, id: &Identifier) -> Option<(&str, usize)> {
        self.columns.iter().find_map(|column| {
            column
                .items
                .iter()
                .position(|item| item == id)
                .map(|index| (column.status.as_str(), index))
        })
    }

    /// Total number of items on the board.
    pub fn len(&self) -> usize {
        self.columns.iter().map(|c| c.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The partition after `mv`. `self` is left untouched.
    ///
    /// `to_index` is a position in the destination column after the item
    /// has been taken out of its source column.
    pub fn apply_move(&self, mv: &BoardMove) -> Result<BoardColumns, BoardError> {
        if self.locate(&mv.item_id).is_none() {
            return Err(BoardError::UnknownItem {
                id: mv.item_id.clone(),
            });
        }
        let from = self.position(&mv.from_column)?;
        let to = self.position(&mv.to_column)?;

        let source = &self.columns[from];
        let found = source
            .items
            .get(mv.from_index)
            .ok_or_else(|| BoardError::IndexOutOfRange {
                column: mv.from_column.clone(),
                index: mv.from_index,
                len: source.items.len(),
            })?;
        if *found != mv.item_id {
            return Err(BoardError::ItemMismatch {
                column: mv.from_column.clone(),
                index: mv.from_index,
                expected: mv.item_id.clone(),
                found: found.clone(),
            });
        }

        let mut next = self.clone();
        let item = next.columns[from].items.remove(mv.from_index);
        let target = &mut next.columns[to].items;
        if mv.to_index > target.len() {
            return Err(BoardError::IndexOutOfRange {
                column: mv.to_column.clone(),
                index: mv.to_index,
                len: target.len(),
            });
        }
        target.insert(mv.to_index, item);
        Ok(next)
    }

    fn position(&self, status: &str) -> Result<usize, BoardError> {
        self.columns
            .iter()
            .position(|c| c.status == status)
            .ok_or_else(|| BoardError::UnknownColumn {
                column: status.to_string(),
            })
    }
}

/// One drag-and-drop gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMove {
    pub item_id: Identifier,
    pub from_column: String,
    pub from_index: usize,
    pub to_column: String,
    pub to_index: usize,
}

impl BoardMove {
    pub fn new(
        item_id: impl Into<Identifier>,
        from: (&str, usize),
        to: (&str, usize),
    ) -> Self {
        Self {
            item_id: item_id.into(),
            from_column: from.0.to_string(),
            from_index: from.1,
            to_column: to.0.to_string(),
            to_index: to.1,
        }
    }

    /// Dropped where it was picked up.
    pub fn is_noop(&self) -> bool {
        self.from_column == self.to_column && self.from_index == self.to_index
    }

    pub fn changes_column(&self) -> bool {
        self.from_column != self.to_column
    }
}

// ============================================================================
// COORDINATOR
// ============================================================================

/// What [`BoardCoordinator::begin_move`] did to the local board.
#[derive(Debug)]
pub enum MovePlan {
    /// Nothing moved.
    Noop,
    /// Reordered within a column. Position is not persisted.
    LocalOnly,
    /// Applied locally; the status write is still owed.
    Pending(PendingMove),
}

/// A cross-column move that has been applied locally but not persisted.
#[derive(Debug)]
#[must_use = "settle the move or the board never reconciles with the store"]
pub struct PendingMove {
    mv: BoardMove,
    snapshot: BoardColumns,
}

impl PendingMove {
    pub fn board_move(&self) -> &BoardMove {
        &self.mv
    }

    /// The board as it was before the move.
    pub fn snapshot(&self) -> &BoardColumns {
        &self.snapshot
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Unchanged,
    Reordered,
    Confirmed,
    RolledBack(StoreError),
    /// The coordinator was cancelled while the write was outstanding. The
    /// board was left alone.
    Abandoned,
}

/// Owns the local board and keeps it in step with the store.
pub struct BoardCoordinator {
    gateway: MutationGateway,
    notifier: Arc<dyn Notifier>,
    status_field: String,
    id_field: String,
    column_order: Vec<String>,
    board: Mutex<BoardColumns>,
}

impl BoardCoordinator {
    pub fn new(store: Arc<dyn RemoteStore>, config: &DeckConfig) -> Self {
        // Move failures are reported here, with the item context.
        let gateway = MutationGateway::new(store, config.board.resource.as_str())
            .with_id_field(config.id_field.as_str())
            .with_notifier(Arc::new(NullNotifier));
        let column_order = config.board.columns.clone();
        Self {
            gateway,
            notifier: Arc::new(NullNotifier),
            status_field: config.board.status_field.clone(),
            id_field: config.id_field.clone(),
            board: Mutex::new(BoardColumns::from_items::<String>(
                &[],
                &column_order,
                &config.board.status_field,
                &config.id_field,
            )),
            column_order,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.gateway = self.gateway.with_cancellation(token);
        self
    }

    /// Rebuild the board from the authoritative item list.
    pub fn sync(&self, items: &[Record]) {
        let rebuilt =
            BoardColumns::from_items(items, &self.column_order, &self.status_field, &self.id_field);
        *self.board.lock() = rebuilt;
    }

    pub fn columns(&self) -> BoardColumns {
        self.board.lock().clone()
    }

    /// Apply `mv` to the local board immediately.
    pub fn begin_move(&self, mv: BoardMove) -> Result<MovePlan, BoardError> {
        if mv.is_noop() {
            return Ok(MovePlan::Noop);
        }
        let mut board = self.board.lock();
        let next = board.apply_move(&mv)?;
        let snapshot = std::mem::replace(&mut *board, next);
        debug!(item = %mv.item_id, from = %mv.from_column, to = %mv.to_column, "Applied board move locally");

        if mv.changes_column() {
            Ok(MovePlan::Pending(PendingMove { mv, snapshot }))
        } else {
            Ok(MovePlan::LocalOnly)
        }
    }

    /// Persist a pending move, rolling the board back on failure.
    pub async fn settle(&self, pending: PendingMove) -> MoveOutcome {
        let PendingMove { mv, snapshot } = pending;
        let mut payload = Record::new();
        payload.insert(
            self.status_field.clone(),
            Value::String(mv.to_column.clone()),
        );

        match self.gateway.try_update(&mv.item_id, payload).await {
            Ok(_) => {
                self.notifier.notify(Notification::success(format!(
                    "Moved to {}",
                    mv.to_column
                )));
                MoveOutcome::Confirmed
            }
            Err(err) if err.is_cancelled() => {
                debug!(item = %mv.item_id, "Board move abandoned");
                MoveOutcome::Abandoned
            }
            Err(err) => {
                let err = match err {
                    DeckError::Store(err) => err,
                    other => StoreError::query(self.gateway.resource(), other.to_string()),
                };
                warn!(item = %mv.item_id, reason = %err, "Board move failed, rolling back");
                *self.board.lock() = snapshot;
                self.notifier
                    .notify(Notification::failure(format!("Failed to move item {}", mv.item_id)));
                MoveOutcome::RolledBack(err)
            }
        }
    }

    /// [`begin_move`](Self::begin_move) then, if needed, [`settle`](Self::settle).
    pub async fn move_item(&self, mv: BoardMove) -> Result<MoveOutcome, BoardError> {
        let outcome = match self.begin_move(mv)? {
            MovePlan::Noop => MoveOutcome::Unchanged,
            MovePlan::LocalOnly => MoveOutcome::Reordered,
            MovePlan::Pending(pending) => self.settle(pending).await,
        };
        Ok(outcome)
    }

    pub fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }
}

impl std::fmt::Debug for BoardCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardCoordinator")
            .field("resource", &self.gateway.resource())
            .field("status_field", &self.status_field)
            .field("board", &*self.board.lock())
            .finish()
    }
}


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
